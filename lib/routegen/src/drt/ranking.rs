use crate::Map;
use crate::data::*;
use super::SearchError;

/// Per-request search state. The instance `Request` stays immutable;
/// everything the construction loop mutates lives here.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub id: ReqId,
    pub feasible: bool,
    pub dist_to_attend: Dist,
    pub scores: RankScores,
}

impl Candidate {
    pub fn new(id: ReqId) -> Self {
        return Candidate {
            id,
            feasible: true,
            dist_to_attend: 0,
            scores: RankScores::default(),
        };
    }
}

/// Normalized sub-scores and their weighted composite (the request
/// ranking function). All sub-scores lie in [0, 1]; larger means more
/// urgent to insert.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RankScores {
    pub distance: f64,
    pub tw_lower: f64,
    pub tw_upper: f64,
    pub origin_load: f64,
    pub destination_load: f64,
    pub composite: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankWeights {
    pub distance: f64,
    pub tw_lower: f64,
    pub tw_upper: f64,
    pub origin_load: f64,
    pub destination_load: f64,
}

// Window-lower dominates: earliest deadlines go first.
impl Default for RankWeights {
    fn default() -> Self {
        return RankWeights {
            distance: 0.1,
            tw_lower: 0.5,
            tw_upper: 0.1,
            origin_load: 0.1,
            destination_load: 0.1,
        };
    }
}

/// Net boardings minus alightings per node, a congestion proxy.
#[derive(Debug, Clone)]
pub struct LoadIndices(Map<Loc, i64>);

impl LoadIndices {
    pub fn build(data: &DrtInstance) -> Self {
        let mut loads: Map<Loc, i64> = Map::default();
        for r in &data.requests {
            *loads.entry(r.origin).or_insert(0) += 1;
            *loads.entry(r.destination).or_insert(0) -= 1;
        }
        return LoadIndices(loads);
    }

    #[inline]
    pub fn get(&self, l: Loc) -> i64 {
        return self.0.get(&l).copied().unwrap_or(0);
    }
}

// Min-max normalization; a degenerate dimension scores 0.
#[inline]
fn norm_asc(v: f64, min: f64, max: f64) -> f64 {
    if max <= min { 0.0 } else { (v - min) / (max - min) }
}

#[inline]
fn norm_desc(v: f64, min: f64, max: f64) -> f64 {
    if max <= min { 0.0 } else { (max - v) / (max - min) }
}

/// Recompute every candidate's ranking function from the current
/// position. Pool min/max statistics shift after every insertion, so
/// this runs before each pick.
pub fn rank(
    pool: &mut [Candidate],
    at: Loc,
    data: &DrtInstance,
    loads: &LoadIndices,
    weights: &RankWeights,
) -> Result<(), SearchError> {
    if pool.is_empty() {
        return Ok(());
    }

    let mut dims: Vec<(f64, f64, f64, f64, f64)> = Vec::with_capacity(pool.len());
    for c in pool.iter_mut() {
        let r = data.req(c.id)?;
        c.dist_to_attend = data.dist(at, r.destination);
        dims.push((
            c.dist_to_attend as f64,
            r.tw_start as f64,
            r.tw_end as f64,
            loads.get(r.origin) as f64,
            loads.get(r.destination) as f64,
        ));
    }

    let mut lo = dims[0];
    let mut hi = dims[0];
    for &d in &dims[1..] {
        lo = (lo.0.min(d.0), lo.1.min(d.1), lo.2.min(d.2), lo.3.min(d.3), lo.4.min(d.4));
        hi = (hi.0.max(d.0), hi.1.max(d.1), hi.2.max(d.2), hi.3.max(d.3), hi.4.max(d.4));
    }

    for (c, d) in pool.iter_mut().zip(&dims) {
        // closer and earlier-deadline requests score higher; busier
        // nodes score higher
        let scores = RankScores {
            distance: norm_desc(d.0, lo.0, hi.0),
            tw_lower: norm_desc(d.1, lo.1, hi.1),
            tw_upper: norm_desc(d.2, lo.2, hi.2),
            origin_load: norm_asc(d.3, lo.3, hi.3),
            destination_load: norm_asc(d.4, lo.4, hi.4),
            composite: 0.0,
        };
        let composite = weights.distance * scores.distance
            + weights.tw_lower * scores.tw_lower
            + weights.tw_upper * scores.tw_upper
            + weights.origin_load * scores.origin_load
            + weights.destination_load * scores.destination_load;
        c.scores = RankScores { composite, ..scores };
    }
    return Ok(());
}

/// Index of the best-ranked feasible candidate, if any. Ties go to the
/// earlier pool position.
pub fn best_feasible(pool: &[Candidate]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (k, c) in pool.iter().enumerate() {
        if !c.feasible {
            continue;
        }
        match best {
            Some((_, score)) if c.scores.composite <= score => {}
            _ => best = Some((k, c.scores.composite)),
        }
    }
    return best.map(|(k, _)| k);
}

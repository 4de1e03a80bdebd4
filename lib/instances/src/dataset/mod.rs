pub mod drt;

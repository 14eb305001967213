pub mod aa;

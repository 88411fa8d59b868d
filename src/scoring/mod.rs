pub mod correlation;
pub mod scanner;

pub mod countdown;
pub mod errors;
pub mod machine;
pub mod runner;

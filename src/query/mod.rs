pub mod ast;
pub mod planner;
pub mod matcher;
pub mod domain;

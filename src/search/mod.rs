pub mod executor;
pub mod fulltext;
pub mod results;

pub mod overlap;
pub mod seeddb;
pub mod seqdb;

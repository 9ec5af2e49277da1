pub mod countdown;
pub mod evaluation;
pub mod grader;
pub mod grading;
pub mod session;
pub mod task;

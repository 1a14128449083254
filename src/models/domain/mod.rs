pub mod question;
pub mod session;
pub use question::{GeneratedQuestion, LocationContext, Question, QuestionType};
pub use session::{CreatedTest, GeneratedTest, SessionDetails, TestSettings, TimelineSection};

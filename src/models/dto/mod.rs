pub mod request;
pub mod response;

pub use request::{GenerateQuizRequest, OutputFormat, TestAgentRequest};
pub use response::{GenerateQuizResponse, TestAgentResponse};

pub mod extraction;
pub mod gemini_client;
pub mod prompt;

pub use extraction::{extract_json_text, parse_and_validate, parse_generated_plan, strip_code_fences};
pub use gemini_client::{GeminiClient, GenerateContentRequest, ItineraryGenerator, RetryPolicy};
pub use prompt::build_itinerary_prompt;

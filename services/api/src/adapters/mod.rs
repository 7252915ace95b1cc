pub mod analysis_http;
pub mod followup_http;
mod response;

pub use analysis_http::HttpAnalysisAdapter;
pub use followup_http::HttpFollowupAdapter;

mod handlers;
mod models;
mod page;
mod state;
mod translate;

pub use handlers::{router, run_server};
pub use models::{
    ErrorResponse, ExtractRequest, ExtractResponse, LanguageOption, LanguagesResponse,
    SpeakRequest, SpeakResponse, TranslateRequest, TranslateResponse,
};
pub use state::ServerState;

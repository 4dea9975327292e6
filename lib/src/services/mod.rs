use reqwest::{Client, Method, RequestBuilder, StatusCode};
use thiserror::Error;
use url::Url;

use self::{gemini::GeminiService, telegram::TelegramService};

pub mod gemini;
pub mod telegram;

/// Clients for the external APIs the platform delegates to: the generative
/// language model and the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct Services {
    pub gemini: GeminiService,
    pub telegram: TelegramService,
}

impl Services {
    pub fn from_config(conf: &crate::config::Config) -> Self {
        Self {
            gemini: GeminiService::new(
                Service::new("gemini", conf.gemini.api_url.clone()),
                conf.gemini.api_key.clone(),
                conf.gemini.model.clone(),
            ),
            telegram: TelegramService::new(
                Service::new("telegram", conf.telegram.api_url.clone()),
                conf.telegram.bot_token.clone(),
                conf.telegram.operations_chat_id,
            ),
        }
    }
}

#[derive(Debug, Clone)]
struct Service {
    name: &'static str,
    base_url: Url,
    client: Client,
}

impl Service {
    fn new(name: &'static str, base_url: Url) -> Self {
        Self {
            name,
            base_url,
            client: Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut url = self.base_url.clone();
        {
            // extend the path segment-wise; a plain join would misread
            // segments like "bot<token>:..." as a url scheme
            let mut segments = url.path_segments_mut().expect("could not build url");
            segments.pop_if_empty();
            segments.extend(path.trim_start_matches('/').split('/'));
        }
        self.client.request(method, url)
    }
}

macro_rules! methods {
    ($($method:ident),*) => {
        paste::paste! {
            $(
                #[allow(dead_code)]
                fn $method(&self, path: &str) -> RequestBuilder {
                    self.request(Method::[< $method:upper >], path)
                }
            )*
        }
    };
}

impl Service {
    methods!(get, post);
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("reqwest error: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("unexpected response status code: {0}")]
    UnexpectedStatusCode(StatusCode),
    #[error("malformed response from {0}")]
    MalformedResponse(&'static str),
    #[error("{0} rejected the request")]
    Rejected(&'static str),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

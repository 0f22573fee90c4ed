use std::collections::HashMap;

use serde::Deserialize;

/// Body of the JSON `Check` call: `{"attributes":{"request":{"http":{"headers":{..}}}}}`.
#[derive(Debug, Default, Deserialize)]
pub struct CheckRequestBody {
    #[serde(default)]
    pub attributes: AttributeContext,
}

#[derive(Debug, Default, Deserialize)]
pub struct AttributeContext {
    #[serde(default)]
    pub request: RequestAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestAttributes {
    #[serde(default)]
    pub http: HttpRequestAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub struct HttpRequestAttributes {
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl CheckRequestBody {
    pub fn into_headers(self) -> HashMap<String, String> {
        self.attributes.request.http.headers
    }
}

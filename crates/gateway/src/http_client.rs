use std::time::Duration;

use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue},
    redirect,
};

pub(crate) fn default_http_client_builder() -> reqwest::ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    Client::builder()
        .timeout(Duration::from_secs(60))
        // A successful login is a redirect carrying the session cookie.
        .redirect(redirect::Policy::none())
        .cookie_store(true)
        .tcp_nodelay(true)
        .default_headers(headers)
}

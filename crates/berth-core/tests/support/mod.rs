#![allow(dead_code)]

use berth_core::api::PortainerClient;
use berth_core::session::Session;
use mockito::ServerGuard;
use url::Url;

pub const TOKEN: &str = "test-jwt";

pub fn bearer() -> String {
    format!("Bearer {TOKEN}")
}

/// Client pointed at the mock server, without a session.
pub fn anonymous_client(server: &ServerGuard) -> PortainerClient {
    let url = Url::parse(&server.url()).expect("mock server URL");
    PortainerClient::new(&url, None).expect("client")
}

/// Client pointed at the mock server, carrying [`TOKEN`].
pub fn authorized_client(server: &ServerGuard) -> PortainerClient {
    anonymous_client(server).with_session(Session::new(TOKEN))
}

pub const JSON: (&str, &str) = ("content-type", "application/json");

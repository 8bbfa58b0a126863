#![allow(dead_code)]

use connectmls_api::networking::{Cookie, CookieJar};
use connectmls_api::{Client, ClientConfig, Portal};
use std::sync::Arc;
use tokio::runtime::Runtime;
use wiremock::matchers::{header_regex, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const SESSION_COOKIE: &str = "JSESSIONID=tenant-session";

/// A mock portal on a local port, driven from plain (blocking) test code
///
/// The server lives on its own multi-thread runtime so the blocking client can
/// be called from the test thread.
pub struct MockPortal {
    // dropped before the runtime it runs on
    server: MockServer,
    runtime: Runtime,
}

impl MockPortal {
    pub fn start() -> Self {
        let _ = pretty_env_logger::try_init();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("failed to build runtime");
        let server = runtime.block_on(MockServer::start());
        MockPortal { server, runtime }
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Portal endpoints pointing at this server; 127.0.0.1 plays the tenant host
    pub fn config(&self) -> ClientConfig {
        let uri = self.uri();
        ClientConfig {
            portal: Portal {
                login_url: format!("{}/slogin.jsp", uri),
                credential_check_url: format!("{}/oid/j_spring_security_check", uri),
                login_failure_url: format!("{}/oid/login?error=failure", uri),
                tenant_host_pattern: r"127\.0\.0\.1".to_string(),
                tenant_scheme: "http".to_string(),
                tenant_port: Some(self.server.address().port()),
                sign_in_path: "/tenant/slogin.jsp".to_string(),
                max_redirects: 5,
            },
            ..ClientConfig::default()
        }
        .with_timeouts(5, 5)
    }

    /// A client whose jar already holds a tenant session cookie
    pub fn client(&self) -> Client {
        let cookies = Arc::new(CookieJar::new());
        cookies.insert(Cookie::new("127.0.0.1", "JSESSIONID", "tenant-session"));
        Client::with_cookies(cookies, &self.config()).expect("failed to build client")
    }

    pub fn received(&self) -> Vec<Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    pub fn received_paths(&self) -> Vec<String> {
        self.received()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }

    pub fn verify(&self) {
        self.runtime.block_on(self.server.verify());
    }
}

pub const LOGIN_FORM: &str = r#"<html><body>
<form id="loginForm" method="post" action="j_spring_security_check">
  <input type="text" name="j_username" />
  <input type="password" name="j_password" />
  <input type="hidden" name="_csrf" value="csrf-7d1e" />
</form>
</body></html>"#;

/// Mounts the entry redirect and the login form
pub fn mount_login_page(portal: &MockPortal, form: &'static str) {
    portal.mount(
        Mock::given(method("GET"))
            .and(path("/slogin.jsp"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/oid/login")),
    );
    portal.mount(
        Mock::given(method("GET"))
            .and(path("/oid/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", "PREAUTH=pre-1; Path=/")
                    .set_body_string(form),
            ),
    );
}

pub fn mount_credential_check(portal: &MockPortal, location: String) {
    portal.mount(
        Mock::given(method("POST"))
            .and(path("/oid/j_spring_security_check"))
            .and(query_param("_csrf", "csrf-7d1e"))
            .and(query_param("j_username", "agent42"))
            .and(query_param("j_password", "hunter2"))
            .and(query_param("fromurl", "login.jsp"))
            .and(header_regex("cookie", "PREAUTH=pre-1"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", location.as_str())),
    );
}

pub fn mount_authorize_and_sign_in(portal: &MockPortal) {
    let script = format!(
        "<script>window.location.replace('{}/tenant/slogin.jsp?state=s1&code=EX-99');</script>",
        portal.uri()
    );
    portal.mount(
        Mock::given(method("GET"))
            .and(path("/oid/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_string(script)),
    );
    portal.mount(
        Mock::given(method("GET"))
            .and(path("/tenant/slogin.jsp"))
            .and(query_param("code", "EX-99"))
            .and(query_param("deviceType", "desktop"))
            .and(query_param("swidth", "1440"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("Set-Cookie", "JSESSIONID=tenant-1; Path=/; HttpOnly"),
            )
            .expect(1),
    );
}

pub fn mount_full_handshake(portal: &MockPortal) {
    mount_login_page(portal, LOGIN_FORM);
    mount_credential_check(portal, format!("{}/oid/authorize?client_id=connectmls", portal.uri()));
    mount_authorize_and_sign_in(portal);
}

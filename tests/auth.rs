mod common;

use common::{LOGIN_FORM, MockPortal, mount_credential_check, mount_full_handshake, mount_login_page};
use connectmls_api::networking::get_auth_cookies;
use connectmls_api::{Client, ConnectMlsError, LoginInfo, ResponseMode};
use serde_json::json;
use wiremock::matchers::{header_regex, method, path};
use wiremock::{Mock, ResponseTemplate};

fn login() -> LoginInfo {
    LoginInfo::new("agent42", "hunter2")
}

#[test]
fn handshake_yields_tenant_cookies() {
    let portal = MockPortal::start();
    mount_full_handshake(&portal);

    let cookies = get_auth_cookies(&login(), &portal.config()).unwrap();

    assert_eq!(cookies.domains(), vec!["127.0.0.1".to_string()]);
    assert_eq!(cookies.get("127.0.0.1", "JSESSIONID").unwrap().value, "tenant-1");
    assert_eq!(
        portal.received_paths(),
        vec![
            "/slogin.jsp",
            "/oid/login",
            "/oid/j_spring_security_check",
            "/oid/authorize",
            "/tenant/slogin.jsp",
        ]
    );
    portal.verify();
}

#[test]
fn client_login_then_authorised_call() {
    let portal = MockPortal::start();
    mount_full_handshake(&portal);
    portal.mount(
        Mock::given(method("GET"))
            .and(path("/api/clippy/version"))
            .and(header_regex("cookie", "JSESSIONID=tenant-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "7.4.2"}))),
    );

    let client = Client::new(&login(), &portal.config()).unwrap();
    assert_eq!(client.base_url(), portal.uri());

    let version = client.clippy_test(ResponseMode::Decoded).unwrap();
    assert_eq!(
        version.into_decoded().unwrap().value(),
        Some(&json!({"version": "7.4.2"}))
    );
}

#[test]
fn invalid_credentials_stop_the_handshake() {
    let portal = MockPortal::start();
    mount_login_page(&portal, LOGIN_FORM);
    mount_credential_check(&portal, format!("{}/oid/login?error=failure", portal.uri()));
    portal.mount(
        Mock::given(method("GET"))
            .and(path("/oid/authorize"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0),
    );

    let err = get_auth_cookies(&login(), &portal.config()).unwrap_err();

    assert!(matches!(err, ConnectMlsError::InvalidCredentials));
    let paths = portal.received_paths();
    assert!(!paths.iter().any(|p| p == "/oid/authorize" || p == "/tenant/slogin.jsp"));
    portal.verify();
}

#[test]
fn missing_csrf_token_is_protocol_error() {
    let portal = MockPortal::start();
    mount_login_page(&portal, "<html><body><p>Maintenance</p></body></html>");

    let err = get_auth_cookies(&login(), &portal.config()).unwrap_err();

    assert!(matches!(err, ConnectMlsError::ProtocolError(_)));
    assert!(!portal
        .received_paths()
        .iter()
        .any(|p| p == "/oid/j_spring_security_check"));
}

#[test]
fn missing_exchange_code_is_protocol_error() {
    let portal = MockPortal::start();
    mount_login_page(&portal, LOGIN_FORM);
    mount_credential_check(&portal, format!("{}/oid/authorize", portal.uri()));
    portal.mount(
        Mock::given(method("GET"))
            .and(path("/oid/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>denied</html>")),
    );

    assert!(matches!(
        get_auth_cookies(&login(), &portal.config()),
        Err(ConnectMlsError::ProtocolError(_))
    ));
}

#[test]
fn no_tenant_cookie_fails_before_sign_in() {
    let portal = MockPortal::start();
    mount_login_page(&portal, LOGIN_FORM);
    mount_credential_check(&portal, format!("{}/oid/authorize", portal.uri()));
    let script = format!("<script>location='{}/x?a=1&code=EX-99'</script>", portal.uri());
    portal.mount(
        Mock::given(method("GET"))
            .and(path("/oid/authorize"))
            .respond_with(ResponseTemplate::new(200).set_body_string(script)),
    );

    let mut config = portal.config();
    config.portal.tenant_host_pattern = r"connectmls\d.mredllc.com".to_string();

    assert!(matches!(
        get_auth_cookies(&login(), &config),
        Err(ConnectMlsError::ProtocolError(_))
    ));
    assert!(!portal.received_paths().iter().any(|p| p == "/tenant/slogin.jsp"));
}

#[test]
fn redirect_loop_is_capped() {
    let portal = MockPortal::start();
    portal.mount(
        Mock::given(method("GET"))
            .and(path("/slogin.jsp"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/oid/login")),
    );
    portal.mount(
        Mock::given(method("GET"))
            .and(path("/oid/login"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "/oid/login")),
    );

    assert!(matches!(
        get_auth_cookies(&login(), &portal.config()),
        Err(ConnectMlsError::ProtocolError(_))
    ));
}

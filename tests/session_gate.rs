use talaga_terminal::session::{
    AuthConfig, AuthError, GateDecision, GatedAction, SessionGate, SessionToken,
    parse_auth_config_json,
};

const HOUR_MS: i64 = 3_600_000;

#[test]
fn defaults_match_the_shared_password_list() {
    let config = AuthConfig::default();
    assert_eq!(
        config.admin_passwords,
        vec!["admin2025", "talaga123", "manchester2025"]
    );
    assert_eq!(config.session_duration_ms, HOUR_MS);
}

#[test]
fn parses_partial_auth_config() {
    let config = parse_auth_config_json(r#"{"admin_passwords": ["secreto"]}"#).unwrap();
    assert_eq!(config.admin_passwords, vec!["secreto"]);
    assert_eq!(config.session_duration_ms, HOUR_MS);

    let config = parse_auth_config_json(r#"{"admin_passwords": [], "session_duration": 60000}"#)
        .unwrap();
    assert_eq!(config.admin_passwords.len(), 3);
    assert_eq!(config.session_duration_ms, 60_000);

    assert!(parse_auth_config_json("not json").is_err());
}

#[test]
fn wrong_password_keeps_gate_anonymous() {
    let mut gate = SessionGate::new(AuthConfig::default());
    assert_eq!(gate.login("guess", 0), Err(AuthError::WrongPassword));
    assert!(!gate.is_authenticated(0));
    assert!(gate.token().is_none());
}

#[test]
fn pending_action_resumes_exactly_once() {
    let mut gate = SessionGate::new(AuthConfig::default());
    assert_eq!(
        gate.check(GatedAction::AddResult, 1_000),
        GateDecision::PromptLogin
    );
    assert_eq!(
        gate.check(GatedAction::DeleteResult { id: 7 }, 1_000),
        GateDecision::PromptLogin
    );

    let resumed = gate.login("talaga123", 2_000).unwrap();
    assert_eq!(resumed, Some(GatedAction::DeleteResult { id: 7 }));
    assert_eq!(gate.token(), Some(SessionToken { issued_at_ms: 2_000 }));

    gate.logout();
    assert_eq!(gate.login("talaga123", 3_000).unwrap(), None);
}

#[test]
fn authenticated_check_proceeds_until_expiry() {
    let mut gate = SessionGate::new(AuthConfig::default());
    gate.login("admin2025", 0).unwrap();
    assert_eq!(
        gate.check(GatedAction::EditResult { id: 1 }, HOUR_MS - 1),
        GateDecision::Proceed
    );
    assert_eq!(
        gate.check(GatedAction::EditResult { id: 1 }, HOUR_MS),
        GateDecision::PromptLogin
    );
    assert!(gate.token().is_none());
    assert_eq!(gate.pending(), Some(GatedAction::EditResult { id: 1 }));
}

#[test]
fn restore_rejects_expired_tokens() {
    let mut gate = SessionGate::new(AuthConfig::default());
    let token = SessionToken { issued_at_ms: 0 };
    assert!(gate.restore(Some(token), HOUR_MS - 1));
    assert!(gate.is_authenticated(HOUR_MS - 1));
    assert!(!gate.restore(Some(token), HOUR_MS + 1));
    assert!(!gate.restore(None, 0));
}

#[test]
fn logout_clears_pending_intent() {
    let mut gate = SessionGate::new(AuthConfig::default());
    gate.check(GatedAction::AddResult, 0);
    gate.logout();
    assert_eq!(gate.pending(), None);
}

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, EncodingKey, Header};
use reroute::{parse, Matcher, Request, Rule};
use serde_json::json;

const SECRET: &str = "foobar";

fn rules(source: &str) -> Vec<Rule> {
    let result = parse(source);
    assert!(result.is_ok(), "unexpected errors: {:?}", result.errors());
    result.into_rules()
}

fn token(mut payload: serde_json::Value) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 600;
    payload["exp"] = json!(exp);
    encode(
        &Header::default(),
        &payload,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

fn signed_in(path: &str, roles: serde_json::Value) -> Request {
    let payload = json!({"app_metadata": {"authorization": {"roles": roles}}});
    Request::new(path).with_cookie("nf_jwt", token(payload))
}

#[test]
fn role_gated_rewrite_with_valid_token() {
    let table = rules("/admin/*  /admin/:splat 200 Role=admin");
    let matcher = Matcher::new(&table).with_secret(SECRET);

    let result = matcher.resolve(&signed_in("/admin/users", json!(["admin"])));
    assert_eq!(
        result.condition("JWT").as_deref(),
        Some("app_metadata.authorization.roles:admin")
    );
    let hit = result.into_rule().unwrap();
    assert_eq!(hit.to, "/admin/users");
    assert_eq!(hit.status, 200);
    assert!(hit.force_match);
}

#[test]
fn wildcard_role_catches_any_authenticated_visitor() {
    let table = rules(
        "/membership/ /membership/member 200 Role=member
/membership/ /membership/smashing 200 Role=smashing
/membership/ /membership/free 200 Role=*
/membership/ /membership/ 200
",
    );
    let matcher = Matcher::new(&table).with_secret(SECRET);

    // Anonymous visitors fall through to the unconditional rule.
    let result = matcher.resolve(&Request::new("/membership/"));
    let hit = result.rule().unwrap();
    assert_eq!(hit.to, "/membership/");
    assert_eq!(hit.status, 200);
    assert!(hit.force_match);
    assert!(result.condition("JWT").is_none());

    let result = matcher.resolve(&signed_in("/membership/", json!(["admin"])));
    assert_eq!(result.rule().unwrap().to, "/membership/free");
    assert_eq!(
        result.condition("JWT").as_deref(),
        Some("app_metadata.authorization.roles:*")
    );

    let result = matcher.resolve(&signed_in("/membership/", json!(["smashing"])));
    assert_eq!(result.rule().unwrap().to, "/membership/smashing");
    assert_eq!(
        result.condition("JWT").as_deref(),
        Some("app_metadata.authorization.roles:smashing")
    );
}

#[test]
fn multiple_roles_match_on_intersection() {
    let table = rules("/member/*  /member/:splat 200 Role=admin,member");
    let matcher = Matcher::new(&table).with_secret(SECRET);

    let result = matcher.resolve(&signed_in("/member/users", json!(["member"])));
    assert!(result.is_match());
    assert_eq!(
        result.condition("JWT").as_deref(),
        Some("app_metadata.authorization.roles:admin,member")
    );
}

#[test]
fn string_role_claim_counts_as_one_role() {
    let table = rules("/member/*  /member/:splat 200 Role=admin,member");
    let matcher = Matcher::new(&table).with_secret(SECRET);

    let result = matcher.resolve(&signed_in("/member/users", json!("member")));
    assert!(result.is_match());
    assert_eq!(
        result.condition("JWT").as_deref(),
        Some("app_metadata.authorization.roles:admin,member")
    );
}

#[test]
fn falls_back_to_rule_for_a_different_role() {
    let table = rules(
        "/admin/*  /admin/:splat 200 Role=admin
/admin/*  /admin/editor/:splat 200 Role=editor
",
    );
    let matcher = Matcher::new(&table).with_secret(SECRET);

    let result = matcher.resolve(&signed_in("/admin/users", json!(["editor"])));
    assert_eq!(result.rule().unwrap().to, "/admin/editor/users");
    assert_eq!(
        result.condition("JWT").as_deref(),
        Some("app_metadata.authorization.roles:editor")
    );
}

#[test]
fn unauthorized_visitor_falls_back_and_keeps_the_exception() {
    let table = rules(
        "/admin/*  /admin/:splat 200 Role=admin
/admin/*  /admin/editor/:splat 200 Role=editor
/admin/*  /404 404
",
    );
    let matcher = Matcher::new(&table).with_secret(SECRET);

    let result = matcher.resolve(&Request::new("/admin/users"));
    let hit = result.rule().unwrap();
    assert_eq!(hit.status, 404);
    assert_eq!(
        result.exception("JWT").as_deref(),
        Some("app_metadata.authorization.roles:admin,editor")
    );
    assert!(result.conditions().is_empty());
}

#[test]
fn login_fallback_keeps_the_exception() {
    let table = rules(
        "/admin/*  /admin/index.html 200! Role=admin
/admin/*  /admin/login.html 200!
",
    );
    let matcher = Matcher::new(&table).with_secret(SECRET);

    let result = matcher.resolve(&Request::new("/admin/users"));
    assert_eq!(result.rule().unwrap().to, "/admin/login.html");
    assert_eq!(
        result.exception("JWT").as_deref(),
        Some("app_metadata.authorization.roles:admin")
    );
    assert!(result.conditions().is_empty());
}

#[test]
fn no_fallback_forces_a_404() {
    let table = rules("/admin/*  /admin/index.html 200! Role=admin");
    let matcher = Matcher::new(&table).with_secret(SECRET);

    let result = matcher.resolve(&Request::new("/admin/users"));
    assert!(!result.is_match());
    assert!(result.force_404());
    assert_eq!(
        result.exception("JWT").as_deref(),
        Some("app_metadata.authorization.roles:admin")
    );
    assert!(result.conditions().is_empty());
}

#[test]
fn removing_the_fallback_flips_to_a_forced_404() {
    let gated = "/admin/*  /admin/:splat 200 Role=admin
/admin/*  /admin/editor/:splat 200 Role=editor
";
    let request = signed_in("/admin/users", json!(["subscriber"]));

    let with_fallback = rules(&format!("{gated}/admin/*  /404 404\n"));
    let result = Matcher::new(&with_fallback)
        .with_secret(SECRET)
        .resolve(&request);
    assert!(result.is_match());
    assert!(!result.force_404());

    let without_fallback = rules(gated);
    let result = Matcher::new(&without_fallback)
        .with_secret(SECRET)
        .resolve(&request);
    assert!(!result.is_match());
    assert!(result.force_404());
    assert_eq!(
        result.exception("JWT").as_deref(),
        Some("app_metadata.authorization.roles:admin,editor")
    );
}

#[test]
fn custom_claim_path_for_proxy_rules() {
    let table = rules("/private-api/* https://rocky-beach.example.com/private/:splat 200 Role=admin");
    let matcher = Matcher::new(&table)
        .with_secret(SECRET)
        .with_role_claim("app_metadata.roles");

    let payload = json!({"app_metadata": {"roles": ["admin"]}});
    let request = Request::new("/private-api/1234").with_cookie("nf_jwt", token(payload));

    let result = matcher.resolve(&request);
    let hit = result.rule().unwrap();
    assert_eq!(hit.status, 200);
    assert_eq!(hit.to, "https://rocky-beach.example.com/private/1234");
    assert!(hit.proxy);
    assert_eq!(
        result.condition("JWT").as_deref(),
        Some("app_metadata.roles:admin")
    );
}

#[test]
fn expired_token_is_anonymous() {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        - 600;
    let payload = json!({
        "app_metadata": {"authorization": {"roles": ["admin"]}},
        "exp": exp,
    });
    let stale = encode(
        &Header::default(),
        &payload,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let table = rules("/admin/*  /admin/:splat 200 Role=admin");
    let matcher = Matcher::new(&table).with_secret(SECRET);

    let result = matcher.resolve(&Request::new("/admin/users").with_cookie("nf_jwt", stale));
    assert!(!result.is_match());
    assert!(result.force_404());
    assert_eq!(
        result.exception("JWT").as_deref(),
        Some("app_metadata.authorization.roles:admin")
    );
}

#[test]
fn token_signed_with_the_wrong_secret_is_anonymous() {
    let table = rules("/admin/*  /admin/:splat 200 Role=admin");
    let matcher = Matcher::new(&table).with_secret("other-secret");

    let result = matcher.resolve(&signed_in("/admin/users", json!(["admin"])));
    assert!(!result.is_match());
    assert!(result.force_404());
}

#[test]
fn without_a_secret_every_request_is_anonymous() {
    let table = rules("/admin/*  /admin/:splat 200 Role=admin");
    let matcher = Matcher::new(&table);

    let result = matcher.resolve(&signed_in("/admin/users", json!(["admin"])));
    assert!(!result.is_match());
    assert!(result.force_404());
}

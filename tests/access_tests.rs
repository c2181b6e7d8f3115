use moderation_admin::access::{
    self, AccessDecision, DASHBOARD_PATH, LOGIN_PATH, RouteClass, RouteTable, Session, decide,
    evaluate,
};

// --- Helpers ---

const AUTH_PAGES: &[&str] = &[
    "/login",
    "/signup",
    "/reset-password",
    "/update-password",
    "/auth/callback",
    "/auth/redirect",
];
const ADMIN_PAGES: &[&str] = &["/analytics", "/settings"];
const MEMBER_PAGES: &[&str] = &["/dashboard", "/annotate", "/moderation", "/dataset", "/videos"];
const EXCLUDED: &[&str] = &[
    "/_next/static/chunks/main.js",
    "/favicon.ico",
    "/logo.png",
    "/static/app.css",
    "/api/auth/login",
    "/api/auth/logout",
    "/health",
    "/swagger-ui",
    "/api-docs/openapi.json",
];

fn sessions() -> Vec<Session> {
    vec![
        Session::anonymous(),
        Session::authenticated("admin"),
        Session::authenticated("annotator"),
        Session::authenticated("reviewer"),
        Session {
            authenticated: true,
            role: None,
        },
    ]
}

fn to_dashboard() -> AccessDecision {
    AccessDecision::RedirectTo {
        path: DASHBOARD_PATH,
        preserve_return_to: false,
    }
}

fn to_login_returning() -> AccessDecision {
    AccessDecision::RedirectTo {
        path: LOGIN_PATH,
        preserve_return_to: true,
    }
}

// --- Exclusions ---

#[test]
fn test_excluded_paths_always_allow() {
    for path in EXCLUDED {
        for session in sessions() {
            assert_eq!(
                evaluate(path, &session),
                AccessDecision::Allow,
                "{path} should bypass evaluation for {session:?}"
            );
        }
    }
}

#[test]
fn test_dotted_path_under_protected_prefix_is_treated_as_asset() {
    let table = RouteTable::default();
    assert_eq!(table.classify("/dashboard/export.csv"), RouteClass::Excluded);
    assert_eq!(
        evaluate("/dashboard/export.csv", &Session::anonymous()),
        AccessDecision::Allow
    );
}

// --- Auth pages ---

#[test]
fn test_auth_pages_allow_anonymous_and_bounce_signed_in_users() {
    for path in AUTH_PAGES {
        assert_eq!(evaluate(path, &Session::anonymous()), AccessDecision::Allow);
        assert_eq!(evaluate(path, &Session::authenticated("annotator")), to_dashboard());
        assert_eq!(evaluate(path, &Session::authenticated("admin")), to_dashboard());
    }
}

// --- Root ---

#[test]
fn test_root_redirects_by_authentication_without_return_path() {
    assert_eq!(
        evaluate("/", &Session::authenticated("reviewer")),
        to_dashboard()
    );
    assert_eq!(
        evaluate("/", &Session::anonymous()),
        AccessDecision::RedirectTo {
            path: LOGIN_PATH,
            preserve_return_to: false,
        }
    );
}

#[test]
fn test_root_wins_even_if_listed_in_another_table() {
    let table = RouteTable::new(&[], &["/"], &["/"], "/api/", &[]);
    assert_eq!(table.classify("/"), RouteClass::Root);
    assert_eq!(
        table.evaluate("/", &Session::authenticated("annotator")),
        to_dashboard()
    );
}

// --- API ---

#[test]
fn test_api_rejects_anonymous_and_never_redirects() {
    let api_paths = [
        "/api/comments",
        "/api/predictions",
        "/api/videos/vid-1/comments",
        "/api/unknown",
    ];
    for path in api_paths {
        assert_eq!(
            evaluate(path, &Session::anonymous()),
            AccessDecision::RejectUnauthorized
        );
        for session in sessions().into_iter().filter(|s| s.authenticated) {
            assert_eq!(evaluate(path, &session), AccessDecision::Allow);
        }
    }
}

#[test]
fn test_api_prefix_requires_trailing_slash() {
    // `/api` itself is not under the API prefix; it falls back to the unlisted rule.
    assert_eq!(RouteTable::default().classify("/api"), RouteClass::Unlisted);
    assert_eq!(evaluate("/api", &Session::anonymous()), to_login_returning());
}

// --- Protected & Admin ---

#[test]
fn test_admin_pages_check_login_before_role() {
    for path in ADMIN_PAGES {
        assert_eq!(evaluate(path, &Session::anonymous()), to_login_returning());
        assert_eq!(evaluate(path, &Session::authenticated("annotator")), to_dashboard());
        assert_eq!(evaluate(path, &Session::authenticated("reviewer")), to_dashboard());
        assert_eq!(
            evaluate(
                path,
                &Session {
                    authenticated: true,
                    role: None
                }
            ),
            to_dashboard()
        );
        assert_eq!(
            evaluate(path, &Session::authenticated("admin")),
            AccessDecision::Allow
        );
    }
}

#[test]
fn test_member_pages_need_only_a_session() {
    for path in MEMBER_PAGES {
        assert_eq!(evaluate(path, &Session::anonymous()), to_login_returning());
        for session in sessions().into_iter().filter(|s| s.authenticated) {
            assert_eq!(evaluate(path, &session), AccessDecision::Allow);
        }
    }
}

#[test]
fn test_admin_role_string_is_exact() {
    assert_eq!(
        evaluate("/settings", &Session::authenticated("Admin")),
        to_dashboard()
    );
}

#[test]
fn test_admin_only_paths_are_folded_into_protected() {
    // "/reports" is listed only as admin-only; it must still be treated as protected.
    let table = RouteTable::new(&["/login"], &["/dashboard"], &["/reports"], "/api/", &[]);
    assert_eq!(table.classify("/reports"), RouteClass::AdminOnly);
    assert_eq!(
        table.evaluate("/reports", &Session::anonymous()),
        to_login_returning()
    );
}

// --- Default-secure fallback ---

#[test]
fn test_unlisted_paths_behave_like_protected_pages() {
    for path in ["/unknown", "/dashboard/extra", "/admin"] {
        assert_eq!(RouteTable::default().classify(path), RouteClass::Unlisted);
        assert_eq!(evaluate(path, &Session::anonymous()), to_login_returning());
        assert_eq!(
            evaluate(path, &Session::authenticated("annotator")),
            AccessDecision::Allow
        );
    }
}

// --- Decision table & scenarios ---

#[test]
fn test_decide_matches_evaluate_for_every_class() {
    let table = RouteTable::default();
    for path in ["/", "/login", "/api/videos", "/videos", "/analytics", "/nope", "/x.js"] {
        for session in sessions() {
            assert_eq!(
                decide(table.classify(path), &session),
                table.evaluate(path, &session)
            );
        }
    }
}

#[test]
fn test_documented_scenarios() {
    assert_eq!(
        evaluate("/settings", &Session::authenticated("annotator")),
        to_dashboard()
    );

    let decision = evaluate("/annotate", &Session::anonymous());
    assert_eq!(decision, to_login_returning());
    assert_eq!(
        access::redirect_location(LOGIN_PATH, true, "/annotate"),
        "/login?then=%2Fannotate"
    );
    assert_eq!(urlencoding::decode("%2Fannotate").unwrap(), "/annotate");

    assert_eq!(evaluate("/login", &Session::authenticated("admin")), to_dashboard());
    assert_eq!(
        evaluate("/api/comments", &Session::anonymous()),
        AccessDecision::RejectUnauthorized
    );
}

#[test]
fn test_evaluation_is_idempotent() {
    for path in ["/", "/login", "/api/videos", "/settings", "/unknown"] {
        for session in sessions() {
            let snapshot = session.clone();
            let first = evaluate(path, &session);
            let second = evaluate(path, &session);
            assert_eq!(first, second);
            assert_eq!(session, snapshot);
        }
    }
}

// --- Helpers under test ---

#[test]
fn test_redirect_location_only_appends_return_path_when_requested() {
    assert_eq!(
        access::redirect_location(DASHBOARD_PATH, false, "/settings"),
        "/dashboard"
    );
    assert_eq!(
        access::redirect_location(LOGIN_PATH, true, "/a b&c"),
        "/login?then=%2Fa%20b%26c"
    );
}

#[test]
fn test_normalize_path() {
    assert_eq!(access::normalize_path(""), "/");
    assert_eq!(access::normalize_path("/"), "/");
    assert_eq!(access::normalize_path("/dashboard/"), "/dashboard");
    assert_eq!(access::normalize_path("/dashboard?tab=1"), "/dashboard");
    assert_eq!(access::normalize_path("/api/comments"), "/api/comments");
}

//! End-to-end checks of the public pages, the JSON API and the portal
//! against the in-memory backend.

#![allow(clippy::panic)]

mod common;

use common::{CookieJar, TestSite, text};
use energies_site::backend::memory::MemoryBackend;
use energies_site::backend::{AccessToken, AuthBackend, BackendError, Row};
use energies_site::domain::{FuelPrice, NewsItem, SiteSettings};
use reqwest::StatusCode;
use reqwest::header::LOCATION;
use serde_json::{Value, json};

fn row(value: Value) -> Row {
    value.as_object().cloned().unwrap_or_default()
}

async fn seed_price(site: &TestSite, fuel: &str, price: f64, date: &str) {
    let values = row(json!({
        "fuel_type": fuel,
        "price_per_liter": price,
        "region": "Dar es Salaam",
        "effective_date": date,
    }));
    let Ok(_) = site.state.content.table::<FuelPrice>().create(None, values).await else {
        panic!("seed price failed");
    };
}

async fn price_count(site: &TestSite) -> usize {
    let Ok(prices) = site.state.content.table::<FuelPrice>().list(None).await else {
        panic!("prices must list");
    };
    prices.len()
}

#[tokio::test]
async fn home_lists_prices_with_last_updated() {
    let site = TestSite::start().await;
    seed_price(&site, "Diesel", 3231.0, "2025-11-20").await;
    seed_price(&site, "Petrol", 3050.5, "2025-11-24").await;

    let resp = site.get("/", &CookieJar::default()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = text(resp).await;
    assert!(body.contains("Powering Tanzania's Industries"));
    assert!(body.contains("3,231"));
    assert!(body.contains("3,051"));
    assert!(body.contains("Last updated: November 24, 2025"));
    assert!(body.contains("Tanzania Energy"));
}

#[tokio::test]
async fn home_degrades_when_prices_fail() {
    let site = TestSite::start().await;
    site.backend
        .fail_table("fuel_prices", BackendError::Transport("offline".to_string()))
        .await;
    let resp = site.get("/", &CookieJar::default()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(text(resp).await.contains("Prices are currently unavailable"));
}

#[tokio::test]
async fn settings_row_brands_every_page() {
    let site = TestSite::start().await;
    let values = row(json!({ "company_name": "Kilimanjaro Fuels", "logo_url": null }));
    let Ok(_) = site.state.content.table::<SiteSettings>().create(None, values).await else {
        panic!("seed settings failed");
    };
    for path in ["/", "/about", "/services", "/industries", "/contact", "/quote"] {
        let resp = site.get(path, &CookieJar::default()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{path}");
        assert!(text(resp).await.contains("Kilimanjaro Fuels"), "{path}");
    }
}

#[tokio::test]
async fn unknown_paths_render_not_found() {
    let site = TestSite::start().await;
    let resp = site.get("/no-such-page", &CookieJar::default()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = text(resp).await;
    assert!(body.contains("Oops! Page not found"));
    assert!(body.contains("Return to Home"));
}

#[tokio::test]
async fn quote_form_shows_estimate() {
    let site = TestSite::start().await;
    let resp = site
        .post_form(
            "/quote",
            &CookieJar::default(),
            &[
                ("company_name", "BuildTech"),
                ("contact_person", "John Mwamba"),
                ("email", "john@buildtech.co.tz"),
                ("phone", "+255 700 000 000"),
                ("fuel_type", "diesel"),
                ("quantity", "10000"),
                ("delivery_location", "Dodoma"),
                ("additional_info", ""),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = text(resp).await;
    assert!(body.contains("28,500,000"));
    assert!(body.contains("TZS (excluding delivery fees)"));
}

#[tokio::test]
async fn quote_form_rejects_missing_fields() {
    let site = TestSite::start().await;
    let resp = site
        .post_form(
            "/quote",
            &CookieJar::default(),
            &[("company_name", "BuildTech"), ("fuel_type", "diesel")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body = text(resp).await;
    assert!(body.contains("Contact person is required"));
    assert!(body.contains("BuildTech"));
}

#[tokio::test]
async fn contact_form_acknowledges_valid_messages() {
    let site = TestSite::start().await;
    let jar = CookieJar::default();
    let bad = site
        .post_form("/contact", &jar, &[("name", "Amina"), ("email", "amina@example.com")])
        .await;
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    assert!(text(bad).await.contains("Subject is required"));

    let good = site
        .post_form(
            "/contact",
            &jar,
            &[
                ("name", "Amina"),
                ("email", "amina@example.com"),
                ("subject", "Bulk diesel"),
                ("message", "We need 20,000 L monthly."),
            ],
        )
        .await;
    assert_eq!(good.status(), StatusCode::OK);
    assert!(text(good).await.contains("Message sent!"));
}

#[tokio::test]
async fn api_lists_and_quotes() {
    let site = TestSite::start().await;
    seed_price(&site, "Diesel", 3231.0, "2025-11-24").await;

    let Ok(resp) = site.client.get(site.url("/api/v1/fuel-prices")).send().await else {
        panic!("request failed");
    };
    assert_eq!(resp.status(), StatusCode::OK);
    let Ok(prices) = resp.json::<Vec<Value>>().await else {
        panic!("prices must be JSON");
    };
    assert_eq!(prices.len(), 1);

    let Ok(resp) = site
        .client
        .post(site.url("/api/v1/quote"))
        .json(&json!({
            "company_name": "TransLogistics",
            "contact_person": "Sarah Kimaro",
            "email": "sarah@translogistics.co.tz",
            "phone": "+255 711 000 000",
            "fuel_type": "petrol",
            "quantity": "5000",
            "delivery_location": "Arusha",
            "additional_info": ""
        }))
        .send()
        .await
    else {
        panic!("request failed");
    };
    assert_eq!(resp.status(), StatusCode::OK);
    let Ok(quote) = resp.json::<Value>().await else {
        panic!("quote must be JSON");
    };
    assert_eq!(quote.get("total"), Some(&Value::from(15_250_000u64)));
    assert_eq!(quote.get("currency"), Some(&Value::from("TZS")));
}

#[tokio::test]
async fn health_reports_memory_backend() {
    let site = TestSite::start().await;
    let Ok(resp) = site.client.get(site.url("/health")).send().await else {
        panic!("request failed");
    };
    let Ok(health) = resp.json::<Value>().await else {
        panic!("health must be JSON");
    };
    assert_eq!(health.get("status"), Some(&Value::from("healthy")));
    assert_eq!(health.get("backend"), Some(&Value::from("memory")));
}

async fn sign_in_as(site: &TestSite, jar: &mut CookieJar, email: &str, password: &str) {
    let resp = site
        .post_form(
            "/portal/sign-in",
            jar,
            &[("email", email), ("password", password)],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    jar.absorb(resp.headers());
}

#[tokio::test]
async fn anonymous_portal_shows_sign_in_without_a_session() {
    let site = TestSite::start().await;
    let mut jar = CookieJar::default();
    let resp = site.get("/portal", &jar).await;
    assert_eq!(resp.status(), StatusCode::OK);
    jar.absorb(resp.headers());
    assert!(jar.get("portal_session").is_none());
    assert!(site.state.sessions.is_empty().await);
    let body = text(resp).await;
    assert!(body.contains("Access your fuel management dashboard"));

    let resp = site.get("/portal?mode=sign-up", &jar).await;
    assert!(text(resp).await.contains("Create Account"));
}

#[tokio::test]
async fn anonymous_admin_actions_are_unauthorized() {
    let site = TestSite::start().await;
    let resp = site
        .post_form("/portal/admin/news", &CookieJar::default(), &[("_action", "new")])
        .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn regular_user_gets_dashboard_and_is_forbidden_from_admin() {
    let site = TestSite::start().await;
    site.backend.register_user("client@example.com", "secret-pass").await;
    let mut jar = CookieJar::default();

    let resp = site
        .post_form(
            "/portal/sign-in",
            &jar,
            &[("email", "client@example.com"), ("password", "secret-pass")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    jar.absorb(resp.headers());
    assert!(jar.get("sb-access-token").is_some());

    let body = text(site.get("/portal", &jar).await).await;
    assert!(body.contains("Logged in successfully!"));
    assert!(body.contains("Welcome Back!"));
    assert!(body.contains("Signed in as client@example.com"));
    assert!(body.contains("INV-2025-1124"));

    let resp = site
        .post_form("/portal/admin/news", &jar, &[("_action", "new")])
        .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn wrong_password_flashes_the_backend_error() {
    let site = TestSite::start().await;
    site.backend.register_user("client@example.com", "secret-pass").await;
    let mut jar = CookieJar::default();
    let resp = site
        .post_form(
            "/portal/sign-in",
            &jar,
            &[("email", "client@example.com"), ("password", "nope")],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    jar.absorb(resp.headers());
    assert!(jar.get("sb-access-token").is_none());
    let body = text(site.get("/portal", &jar).await).await;
    assert!(body.contains("notice error"));
    assert!(body.contains("Client Portal"));
}

#[tokio::test]
async fn admin_creates_news_through_the_portal() {
    let site = TestSite::start().await;
    let admin = site.backend.register_user("admin@example.com", "admin-pass").await;
    site.backend.grant_role(admin.id, "admin").await;
    let mut jar = CookieJar::default();

    let resp = site
        .post_form(
            "/portal/sign-in",
            &jar,
            &[("email", "admin@example.com"), ("password", "admin-pass")],
        )
        .await;
    jar.absorb(resp.headers());

    let resp = site.get("/portal?tab=news", &jar).await;
    let body = text(resp).await;
    assert!(body.contains("Admin Dashboard"));
    assert!(body.contains("No entries yet."));

    let resp = site
        .post_form(
            "/portal/admin/news",
            &jar,
            &[
                ("_action", "save"),
                ("title", "Mwanza depot opens"),
                ("content", "Serving the Lake Zone."),
                ("is_published", "on"),
            ],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
        Some("/portal")
    );

    let body = text(site.get("/portal", &jar).await).await;
    assert!(body.contains("Mwanza depot opens"));

    let Ok(news) = site.state.content.table::<NewsItem>().list(None).await else {
        panic!("news must list");
    };
    assert_eq!(news.len(), 1);
    let home = text(site.get("/", &CookieJar::default()).await).await;
    assert!(home.contains("Mwanza depot opens"));
}

#[tokio::test]
async fn admin_delete_needs_confirmation() {
    let site = TestSite::start().await;
    let admin = site.backend.register_user("admin@example.com", "admin-pass").await;
    site.backend.grant_role(admin.id, "admin").await;
    seed_price(&site, "Diesel", 3231.0, "2025-11-24").await;
    let Ok(prices) = site.state.content.table::<FuelPrice>().list(None).await else {
        panic!("prices must list");
    };
    let Some(id) = prices.first().map(|p| p.id.to_string()) else {
        panic!("seeded price missing");
    };

    let mut jar = CookieJar::default();
    let resp = site
        .post_form(
            "/portal/sign-in",
            &jar,
            &[("email", "admin@example.com"), ("password", "admin-pass")],
        )
        .await;
    jar.absorb(resp.headers());
    let _ = site.get("/portal?tab=fuel-prices", &jar).await;

    let resp = site
        .post_form(
            "/portal/admin/fuel-prices",
            &jar,
            &[("_action", "delete"), ("_id", &id)],
        )
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let body = text(site.get("/portal", &jar).await).await;
    assert!(body.contains("Confirm Delete"));
    assert_eq!(price_count(&site).await, 1);

    let _ = site
        .post_form(
            "/portal/admin/fuel-prices",
            &jar,
            &[("_action", "confirm-delete"), ("_id", &id)],
        )
        .await;
    assert_eq!(price_count(&site).await, 0);
}

#[tokio::test]
async fn sign_out_clears_the_token_cookie() {
    let site = TestSite::start().await;
    site.backend.register_user("client@example.com", "secret-pass").await;
    let mut jar = CookieJar::default();
    let resp = site
        .post_form(
            "/portal/sign-in",
            &jar,
            &[("email", "client@example.com"), ("password", "secret-pass")],
        )
        .await;
    jar.absorb(resp.headers());

    let resp = site.post_form("/portal/sign-out", &jar, &[]).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    jar.absorb(resp.headers());
    assert!(jar.get("sb-access-token").is_none());
    assert!(jar.get("sb-refresh-token").is_none());
    let Some(location) = resp
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
    else {
        panic!("sign-out redirects");
    };

    let body = text(site.get(&location, &jar).await).await;
    assert!(body.contains("Logged out successfully"));
    assert!(body.contains("Sign In"));
}

#[tokio::test]
async fn cookieless_visits_leave_no_sessions_behind() {
    let site = TestSite::start().await;
    for _ in 0..50 {
        let resp = site.get("/portal", &CookieJar::default()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
    let _ = site
        .post_form("/portal/admin/news", &CookieJar::default(), &[("_action", "new")])
        .await;
    assert_eq!(site.state.sessions.len().await, 0);
    assert_eq!(site.state.auth.subscriber_count(), 0);
}

#[tokio::test]
async fn sign_out_releases_the_session() {
    let site = TestSite::start().await;
    site.backend.register_user("client@example.com", "secret-pass").await;
    let mut jar = CookieJar::default();
    sign_in_as(&site, &mut jar, "client@example.com", "secret-pass").await;
    let _ = site.get("/portal", &jar).await;
    assert_eq!(site.state.sessions.len().await, 1);
    assert_eq!(site.state.auth.subscriber_count(), 1);

    let resp = site.post_form("/portal/sign-out", &jar, &[]).await;
    jar.absorb(resp.headers());
    assert_eq!(site.state.sessions.len().await, 0);
    assert_eq!(site.state.auth.subscriber_count(), 0);

    let _ = site.get("/portal", &jar).await;
    assert_eq!(site.state.sessions.len().await, 0);
}

#[tokio::test]
async fn failed_sign_in_holder_is_dropped_after_its_flash() {
    let site = TestSite::start().await;
    let mut jar = CookieJar::default();
    sign_in_as(&site, &mut jar, "nobody@example.com", "wrong-pass").await;
    assert_eq!(site.state.sessions.len().await, 1);

    let body = text(site.get("/portal", &jar).await).await;
    assert!(body.contains("Invalid login credentials"));
    assert_eq!(site.state.sessions.len().await, 0);
    assert_eq!(site.state.auth.subscriber_count(), 0);

    let body = text(site.get("/portal", &jar).await).await;
    assert!(!body.contains("Invalid login credentials"));
}

#[tokio::test]
async fn restart_after_expiry_restores_from_the_refresh_token() {
    let site = TestSite::start().await;
    site.backend.register_user("client@example.com", "secret-pass").await;
    let mut jar = CookieJar::default();
    sign_in_as(&site, &mut jar, "client@example.com", "secret-pass").await;
    let before = (
        jar.get("sb-access-token").map(str::to_string),
        jar.get("sb-refresh-token").map(str::to_string),
    );
    assert!(before.1.is_some());

    site.backend.expire_sessions().await;
    let restarted = site.restarted().await;
    let resp = restarted.get("/portal", &jar).await;
    jar.absorb(resp.headers());
    let body = text(resp).await;
    assert!(body.contains("Welcome Back!"));
    assert_ne!(jar.get("sb-access-token").map(str::to_string), before.0);
    assert_ne!(jar.get("sb-refresh-token").map(str::to_string), before.1);

    let body = text(restarted.get("/portal", &jar).await).await;
    assert!(body.contains("Welcome Back!"));
}

#[tokio::test]
async fn expiring_session_is_renewed_in_place() {
    let backend = MemoryBackend::with_site_schema().with_token_ttl(chrono::Duration::seconds(30));
    let site = TestSite::with_backend(backend).await;
    let admin = site.backend.register_user("admin@example.com", "admin-pass").await;
    site.backend.grant_role(admin.id, "admin").await;
    let mut jar = CookieJar::default();
    sign_in_as(&site, &mut jar, "admin@example.com", "admin-pass").await;
    let first = jar.get("sb-access-token").map(str::to_string);

    let resp = site.get("/portal", &jar).await;
    jar.absorb(resp.headers());
    let body = text(resp).await;
    assert!(body.contains("Admin Dashboard"));
    let second = jar.get("sb-access-token").map(str::to_string);
    assert_ne!(second, first);

    let resp = site
        .post_form("/portal/admin/news", &jar, &[("_action", "new")])
        .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn revoked_refresh_token_ends_the_session() {
    let backend = MemoryBackend::with_site_schema().with_token_ttl(chrono::Duration::seconds(30));
    let site = TestSite::with_backend(backend).await;
    site.backend.register_user("client@example.com", "secret-pass").await;
    let mut jar = CookieJar::default();
    sign_in_as(&site, &mut jar, "client@example.com", "secret-pass").await;
    let Some(token) = jar.get("sb-access-token").map(AccessToken::new) else {
        panic!("sign-in stores the access token");
    };
    let _ = site.backend.sign_out(&token).await;

    let resp = site.get("/portal", &jar).await;
    jar.absorb(resp.headers());
    let body = text(resp).await;
    assert!(body.contains("Session expired"));
    assert!(body.contains("Sign In"));
    assert!(jar.get("sb-access-token").is_none());
    assert!(jar.get("sb-refresh-token").is_none());
    assert_eq!(site.state.sessions.len().await, 0);
}

use std::collections::BTreeMap;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use entity::fiche_de_paie;
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use products_hr::seed::{self, SeedAdmin};
use sea_orm::{Database, DatabaseConnection, EntityTrait};
use server::{AppConfig, AppState, build_router};
use tower::ServiceExt;

const PASSWORD: &str = "admin123";

fn test_config() -> AppConfig {
    let secret = STANDARD.encode([7u8; 64]);
    AppConfig::from_lookup(|key| match key {
        "COOKIE_SECRET_BASE64" => Some(secret.clone()),
        "COOKIE_SECURE" => Some("false".into()),
        _ => None,
    })
    .unwrap()
}

async fn seeded_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();
    seed::run(&db, &SeedAdmin::default()).await.unwrap();
    db
}

/// Router plus a cookie store, like a browser tab.
struct Browser {
    app: Router,
    cookies: BTreeMap<String, String>,
}

impl Browser {
    fn new(db: DatabaseConnection) -> Self {
        let state = AppState::new(db, test_config()).unwrap();
        Self {
            app: build_router(state),
            cookies: BTreeMap::new(),
        }
    }

    async fn send(&mut self, builder: axum::http::request::Builder, body: Body) -> Response {
        let cookie = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        let builder = if cookie.is_empty() {
            builder
        } else {
            builder.header(header::COOKIE, cookie)
        };
        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        for set in response.headers().get_all(header::SET_COOKIE) {
            let pair = set.to_str().unwrap().split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            if value.is_empty() {
                self.cookies.remove(name);
            } else {
                self.cookies.insert(name.to_string(), value.to_string());
            }
        }
        response
    }

    async fn get(&mut self, uri: &str) -> Response {
        self.send(Request::get(uri), Body::empty()).await
    }

    async fn post_form(&mut self, uri: &str, form: &str) -> Response {
        let builder = Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(builder, Body::from(form.to_string())).await
    }

    async fn login(&mut self, email: &str) -> Response {
        let form = format!("email={}&password={PASSWORD}", email.replace('@', "%40"));
        self.post_form("/login", &form).await
    }
}

fn location(response: &Response) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[tokio::test]
async fn health_reports_database() {
    let mut browser = Browser::new(seeded_db().await);
    let response = browser.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("\"db_ok\":true"), "{body}");
}

#[tokio::test]
async fn pages_require_a_session() {
    let mut browser = Browser::new(seeded_db().await);
    let response = browser.get("/employees").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = browser.get("/").await;
    assert_eq!(location(&response), "/home");
}

#[tokio::test]
async fn login_opens_a_session_and_logout_closes_it() {
    let mut browser = Browser::new(seeded_db().await);
    let response = browser.login("admin@cy-rh.local").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/home");
    assert!(browser.cookies.contains_key("rh_session"));

    let response = browser.get("/home").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Bienvenue"));

    let stale = browser.cookies.clone();
    let response = browser.get("/logout").await;
    assert_eq!(location(&response), "/login?logout");
    assert!(!browser.cookies.contains_key("rh_session"));

    browser.cookies = stale;
    let response = browser.get("/home").await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn wrong_password_returns_to_login_with_error() {
    let mut browser = Browser::new(seeded_db().await);
    let response = browser
        .post_form("/login", "email=admin%40cy-rh.local&password=nope")
        .await;
    assert_eq!(location(&response), "/login?error");
    assert!(!browser.cookies.contains_key("rh_session"));

    let response = browser.get("/login?error").await;
    assert!(body_text(response).await.contains("Email ou mot de passe incorrect"));
}

#[tokio::test]
async fn employee_is_turned_away_from_admin_forms() {
    let mut browser = Browser::new(seeded_db().await);
    browser.login("hugo.lefevre@cy-rh.local").await;

    let response = browser.get("/employees/add").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/employees");
    assert!(browser.cookies.contains_key("rh_flash"));

    let response = browser.get("/employees").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Seul un administrateur peut ajouter un employé"), "{body}");
    assert!(!browser.cookies.contains_key("rh_flash"));
}

#[tokio::test]
async fn invalid_employee_form_is_rendered_again() {
    let mut browser = Browser::new(seeded_db().await);
    browser.login("admin@cy-rh.local").await;

    let response = browser
        .post_form("/employees/save", "id=&matricule=&nom=Dupont&prenom=Jean")
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Le matricule est obligatoire"), "{body}");
    assert!(body.contains("value=\"Dupont\""));
}

#[tokio::test]
async fn admin_creates_an_employee() {
    let mut browser = Browser::new(seeded_db().await);
    browser.login("admin@cy-rh.local").await;

    let form = "id=&matricule=EMP100&nom=Dupont&prenom=Jean&email=jean.dupont%40cy-rh.local\
                &telephone=&password=secret1&poste=Analyste&grade=Cadre&salaire_base=2500.00\
                &date_embauche=2023-05-02&id_departement=&role=EMPLOYE";
    let response = browser.post_form("/employees/save", form).await;
    assert_eq!(location(&response), "/employees");

    let body = body_text(browser.get("/employees").await).await;
    assert!(body.contains("Employé enregistré avec succès"), "{body}");
    assert!(body.contains("jean.dupont@cy-rh.local"));
}

#[tokio::test]
async fn payslip_export_checks_visibility() {
    let db = seeded_db().await;
    let fiches = fiche_de_paie::Entity::find().all(&db).await.unwrap();
    let hugo = platform_db::employees::find_by_email(&db, "hugo.lefevre@cy-rh.local")
        .await
        .unwrap()
        .unwrap();
    let own = fiches.iter().find(|f| f.id_employer == hugo.id).unwrap().id;
    let other = fiches.iter().find(|f| f.id_employer != hugo.id).unwrap().id;

    let mut browser = Browser::new(db);
    browser.login("hugo.lefevre@cy-rh.local").await;

    let response = browser.get(&format!("/fiches-paie/export/{other}/pdf")).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = browser.get("/fiches-paie/export/9999/pdf").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = browser.get(&format!("/fiches-paie/export/{own}/pdf")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"fiche_paie_JANVIER_2024.pdf\""
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.starts_with(b"%PDF"));
}

#[tokio::test]
async fn employee_sees_only_own_payslips() {
    let mut browser = Browser::new(seeded_db().await);
    browser.login("hugo.lefevre@cy-rh.local").await;
    let body = body_text(browser.get("/fiches-paie").await).await;
    assert!(body.contains("Lefèvre"), "{body}");
    assert!(!body.contains("Martin"));
    assert!(!body.contains("Créer une fiche de paie"));
}

#[tokio::test]
async fn listing_exports_are_pdf_downloads() {
    let mut browser = Browser::new(seeded_db().await);
    browser.login("admin@cy-rh.local").await;
    for uri in ["/employees/export/pdf", "/departements/export/pdf", "/projets/export/pdf"] {
        let response = browser.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.starts_with("attachment; filename=\"rapport_"), "{disposition}");
    }
}

#[tokio::test]
async fn list_pages_apply_search_and_filters() {
    let mut browser = Browser::new(seeded_db().await);
    browser.login("admin@cy-rh.local").await;

    let response = browser.get("/employees?q=martin&departement=&role=").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("claire.martin@cy-rh.local"), "{body}");
    assert!(!body.contains("lea.roux@cy-rh.local"));
    assert!(body.contains("value=\"martin\""));

    let body = body_text(browser.get("/home/projets?etat=TERMINE").await).await;
    assert!(body.contains("Migration comptable"), "{body}");
    assert!(!body.contains("Portail collaborateurs"));

    let body = body_text(browser.get("/fiches-paie?annee=2023").await).await;
    assert!(body.contains("Aucune fiche de paie."), "{body}");
}

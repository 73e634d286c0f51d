//! A demo server showing groups, middleware, templates and static files.
//!
//! Run with `RUST_LOG=info cargo run --example http_server`, then try:
//!
//! - `curl http://127.0.0.1:8080/api/speak?name=geek`
//! - `curl http://127.0.0.1:8080/api/students`
//! - `curl http://127.0.0.1:8080/auth/hello/geek` (rejected by the auth middleware)

use std::time::{SystemTime, UNIX_EPOCH};

use log::{info, warn};
use serde::Serialize;
use serde_json::{json, Value};

use microrouter::{Context, Engine, HttpServer, ServerConfig, StatusCode, logger};

#[derive(Serialize)]
struct Student {
    name: &'static str,
    age: u8,
}

const CSS_TEMPLATE: &str = r#"<html><link rel="stylesheet" href="/assets/css/geektutu.css"><p>geektutu.css is loaded</p></html>"#;
const ARR_TEMPLATE: &str = "<html><h1>{{ .title }}</h1><p>0: {{ .students.0.name }} is {{ .students.0.age }} years old</p><p>1: {{ .students.1.name }} is {{ .students.1.age }} years old</p></html>";
const DATE_TEMPLATE: &str = "<html><h1>hello, {{ .title }}</h1><p>Date: {{ formatAsDate .now }}</p></html>";

/// Render a unix timestamp (seconds) as `YYYY-MM-DD` in UTC.
fn format_as_date(value: &Value) -> String {
    let Some(secs) = value.as_i64() else {
        return String::new();
    };
    // days-to-civil conversion on the proleptic Gregorian calendar
    let days = secs.div_euclid(86_400);
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    format!("{year}-{month:02}-{day:02}")
}

fn only_for_auth(ctx: &mut Context) {
    let start = SystemTime::now();
    ctx.fail(StatusCode::InternalServerError, "Internal Server Error");
    let elapsed = start.elapsed().unwrap_or_default();
    info!("[{}] {} in {:?} for group auth", ctx.status_code().as_u16(), ctx.request_uri(), elapsed);
}

fn load_templates(engine: &mut Engine) -> Result<(), Box<dyn std::error::Error>> {
    if engine.load_html_glob("templates/*").is_ok() {
        return Ok(());
    }
    warn!("no templates/ directory, using built-in templates");
    engine.add_html_template("css.tmpl", CSS_TEMPLATE)?;
    engine.add_html_template("arr.tmpl", ARR_TEMPLATE)?;
    engine.add_html_template("custom_func.tmpl", DATE_TEMPLATE)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut engine = Engine::new();
    engine.use_middleware(logger());
    engine.set_func_map("formatAsDate", format_as_date);
    load_templates(&mut engine)?;
    engine.static_files("/assets", "./static");

    {
        let mut api = engine.group("/api");
        api.get("/", |ctx| ctx.html(StatusCode::Ok, "css.tmpl", &Value::Null));
        api.get("/speak", |ctx| {
            let name = ctx.query("name").unwrap_or_default().to_string();
            ctx.string(StatusCode::Ok, format!("hello {name}, you are at {}\n", ctx.path()));
        });
        api.get("/students", |ctx| {
            let students = [Student { name: "geek", age: 20 }, Student { name: "frank", age: 22 }];
            ctx.html(StatusCode::Ok, "arr.tmpl", &json!({ "title": "gee", "students": students }));
        });
        api.get("/date", |ctx| {
            let now = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default();
            ctx.html(StatusCode::Ok, "custom_func.tmpl", &json!({ "title": "gee", "now": now }));
        });
    }

    {
        let mut auth = engine.group("/auth");
        auth.use_middleware(only_for_auth);
        auth.get("/hello/:name", |ctx| {
            let name = ctx.param("name").unwrap_or_default().to_string();
            ctx.string(StatusCode::Ok, format!("hello {name}, you are at {}\n", ctx.path()));
        });
        auth.get("/assets/*filepath", |ctx| {
            let filepath = ctx.param("filepath").map(str::to_string);
            ctx.json(StatusCode::Ok, &json!({ "filepath": filepath }));
        });
    }

    let server = HttpServer::new(ServerConfig::with_addr(":8080")?, engine);
    server.start().await?;

    Ok(())
}

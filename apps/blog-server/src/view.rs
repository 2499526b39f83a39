//! Tera-backed rendering of handler outcomes.

use std::path::Path;

use actix_web::HttpResponse;
use actix_web::http::header::{self, ContentType};
use tera::{Context, Tera};

use blog_core::{Outcome, View};

/// Loaded template set.
pub struct Views {
    tera: Tera,
}

impl Views {
    /// Load every `*.tera` template below `dir`.
    pub fn load(dir: &Path) -> Result<Self, tera::Error> {
        let pattern = format!("{}/**/*.tera", dir.display());
        let mut tera = Tera::new(&pattern)?;
        tera.autoescape_on(vec![".html.tera"]);

        tracing::info!(
            templates = tera.get_template_names().count(),
            dir = %dir.display(),
            "Templates loaded"
        );

        Ok(Self { tera })
    }

    pub fn render(&self, view: &View) -> Result<String, tera::Error> {
        let context = Context::from_serialize(view)?;
        self.tera.render(view.name(), &context)
    }

    /// Turn a handler outcome into an HTTP response.
    pub fn respond(&self, outcome: Outcome) -> Result<HttpResponse, tera::Error> {
        match outcome {
            Outcome::Render(view) => {
                let body = self.render(&view)?;
                Ok(HttpResponse::Ok()
                    .content_type(ContentType::html())
                    .body(body))
            }
            Outcome::Redirect(route) => Ok(HttpResponse::Found()
                .insert_header((header::LOCATION, route.path()))
                .finish()),
        }
    }
}

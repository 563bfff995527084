//! Shared fixtures for integration tests
#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use printpdf::lopdf::content::Content;
use printpdf::lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use tempfile::TempDir;
use tower::ServiceExt;

use foodgram::config::Config;
use foodgram::db::Database;
use foodgram::http::{self, AppState};
use foodgram::models::{
    AuthToken, Ingredient, IngredientAmount, IngredientCreate, RecipeCreate, Tag, TagCreate, User,
    UserCreate,
};
use foodgram::services::recipes::{self, RecipeDetail};
use foodgram::services::{ingredients, tags, RequestUser};

/// A fresh database in a temporary directory
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db = Database::open(dir.path().join("foodgram.db")).unwrap();
        Self { db, _dir: dir }
    }

    /// User with a placeholder hash and the token `token-<username>`
    pub fn user(&self, username: &str) -> RequestUser {
        let conn = self.db.get_conn().unwrap();
        let data = UserCreate {
            email: format!("{}@example.com", username),
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            password: String::new(),
        };
        let user = User::create(&conn, &data, "not-a-real-hash").unwrap();
        AuthToken::insert(&conn, user.id, &token_for(username)).unwrap();
        RequestUser::new(user.id)
    }

    pub fn tag(&self, slug: &str) -> Tag {
        // Colors are unique too; derive one from the number of tags so far
        let n = tags::list_tags(&self.db).unwrap().len() + 1;
        tags::create_tag(
            &self.db,
            TagCreate {
                name: slug.to_uppercase(),
                color: format!("#{:06X}", n * 0x010101),
                slug: slug.to_string(),
            },
        )
        .unwrap()
    }

    pub fn ingredient(&self, name: &str, unit: &str) -> Ingredient {
        ingredients::create_ingredient(
            &self.db,
            IngredientCreate {
                name: name.to_string(),
                measurement_unit: unit.to_string(),
            },
        )
        .unwrap()
    }

    pub fn recipe(
        &self,
        author: RequestUser,
        name: &str,
        tag_ids: &[i64],
        lines: &[(i64, i64)],
    ) -> RecipeDetail {
        recipes::create_recipe(&self.db, author, recipe_payload(name, tag_ids, lines)).unwrap()
    }

    pub fn app(&self) -> Router {
        http::router(AppState::new(self.db.clone(), Config::default()))
    }
}

pub fn token_for(username: &str) -> String {
    format!("token-{}", username)
}

pub fn recipe_payload(name: &str, tag_ids: &[i64], lines: &[(i64, i64)]) -> RecipeCreate {
    RecipeCreate {
        name: name.to_string(),
        text: format!("How to make {}", name),
        image: String::new(),
        cooking_time: 15,
        tags: tag_ids.to_vec(),
        ingredients: lines
            .iter()
            .map(|&(id, amount)| IngredientAmount { id, amount })
            .collect(),
    }
}

/// Request builder that drives a router with `oneshot`
pub struct TestRequest {
    method: Method,
    uri: String,
    headers: Vec<(String, String)>,
    body: Option<String>,
}

impl TestRequest {
    fn new(method: Method, uri: &str) -> Self {
        Self {
            method,
            uri: uri.to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(uri: &str) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::new(Method::POST, uri)
    }

    pub fn patch(uri: &str) -> Self {
        Self::new(Method::PATCH, uri)
    }

    pub fn delete(uri: &str) -> Self {
        Self::new(Method::DELETE, uri)
    }

    pub fn token(mut self, username: &str) -> Self {
        self.headers.push((
            header::AUTHORIZATION.as_str().to_string(),
            format!("Token {}", token_for(username)),
        ));
        self
    }

    pub fn header(mut self, key: &str, value: &str) -> Self {
        self.headers.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<T: Serialize>(mut self, data: &T) -> Self {
        self.body = Some(serde_json::to_string(data).unwrap());
        self.headers.push((
            header::CONTENT_TYPE.as_str().to_string(),
            "application/json".to_string(),
        ));
        self
    }

    pub async fn send(self, app: Router) -> TestResponse {
        let mut builder = Request::builder().method(self.method).uri(self.uri);
        for (key, value) in self.headers {
            builder = builder.header(key, value);
        }
        let request = builder
            .body(Body::from(self.body.unwrap_or_default()))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec();
        TestResponse {
            status,
            headers,
            body,
        }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn header(&self, name: header::HeaderName) -> &str {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    pub fn error_code(&self) -> String {
        self.json()["error"]["code"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

/// Every text run drawn in a PDF, page by page, decoded through each
/// font's ToUnicode map
pub fn pdf_text(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    let mut runs = Vec::new();
    for page_id in doc.get_pages().into_values() {
        let fonts = page_fonts(&doc, page_id);
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let mut glyphs = HashMap::new();
        for op in content.operations {
            match op.operator.as_str() {
                "Tf" => {
                    let name = op.operands[0].as_name().unwrap();
                    glyphs = to_unicode(&doc, fonts[name]);
                }
                "Tj" => {
                    let encoded = op.operands[0].as_str().unwrap();
                    let text: String = encoded
                        .chunks(2)
                        .map(|pair| glyphs[&u16::from_be_bytes([pair[0], pair[1]])])
                        .collect();
                    runs.push(text);
                }
                _ => {}
            }
        }
    }
    runs
}

/// Fonts of a page, following an indirect `/Font` resource entry, which
/// lopdf's `get_page_fonts` does not resolve
fn page_fonts(doc: &Document, page_id: ObjectId) -> BTreeMap<Vec<u8>, &Dictionary> {
    let mut fonts = doc.get_page_fonts(page_id);
    let (inline, ids) = doc.get_page_resources(page_id);
    let resources = inline
        .into_iter()
        .chain(ids.into_iter().filter_map(|id| doc.get_dictionary(id).ok()));
    for res in resources {
        let font_dict = res
            .get(b"Font")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id));
        if let Ok(font_dict) = font_dict {
            for (name, value) in font_dict.iter() {
                let font = match value {
                    Object::Reference(id) => doc.get_dictionary(*id).ok(),
                    Object::Dictionary(dict) => Some(dict),
                    _ => None,
                };
                if let Some(font) = font {
                    fonts.entry(name.clone()).or_insert(font);
                }
            }
        }
    }
    fonts
}

fn to_unicode(doc: &Document, font: &Dictionary) -> HashMap<u16, char> {
    let id = font.get(b"ToUnicode").and_then(Object::as_reference).unwrap();
    let stream = doc.get_object(id).and_then(Object::as_stream).unwrap();
    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let mut map = HashMap::new();
    let mut in_block = false;
    for line in String::from_utf8_lossy(&data).lines() {
        let line = line.trim();
        if line.ends_with("beginbfchar") {
            in_block = true;
        } else if line == "endbfchar" {
            in_block = false;
        } else if in_block {
            let mut hex = line
                .split_whitespace()
                .map(|part| part.trim_matches(|c| c == '<' || c == '>'));
            let gid = u16::from_str_radix(hex.next().unwrap(), 16).unwrap();
            let code = u32::from_str_radix(hex.next().unwrap(), 16).unwrap();
            map.insert(gid, char::from_u32(code).unwrap());
        }
    }
    map
}

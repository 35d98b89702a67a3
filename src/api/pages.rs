//! Read-only HTML pages: home, author listing and book listing

use axum::{extract::State, response::Html};

use crate::{
    error::AppResult,
    models::{AuthorQuery, BookQuery},
    transfer::{AuthorDetail, BookDetail},
    AppState,
};

/// Escape text for inclusion in HTML content or attribute values
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
</head>
<body>
<nav><a href="/">Home</a> | <a href="/authors">Authors</a> | <a href="/books">Books</a></nav>
<h1>{title}</h1>
{body}
</body>
</html>
"#,
        title = escape_html(title),
        body = body
    )
}

fn render_authors(authors: &[AuthorDetail]) -> String {
    if authors.is_empty() {
        return layout("Authors", "<p>No authors in the catalog.</p>");
    }

    let mut rows = String::new();
    for author in authors {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&author.name),
            escape_html(&author.country),
            author.birth_date.map(|d| d.to_string()).unwrap_or_default(),
            author.books.len()
        ));
    }
    layout(
        "Authors",
        &format!(
            "<table>\n<tr><th>Name</th><th>Country</th><th>Birth date</th><th>Books</th></tr>\n{}</table>",
            rows
        ),
    )
}

fn render_books(books: &[BookDetail]) -> String {
    if books.is_empty() {
        return layout("Books", "<p>No books in the catalog.</p>");
    }

    let mut rows = String::new();
    for book in books {
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape_html(&book.title),
            escape_html(&book.author.name),
            book.published_date,
            escape_html(&book.isbn)
        ));
    }
    layout(
        "Books",
        &format!(
            "<table>\n<tr><th>Title</th><th>Author</th><th>Published</th><th>ISBN</th></tr>\n{}</table>",
            rows
        ),
    )
}

pub async fn home() -> Html<String> {
    Html(layout(
        "Library Catalog",
        r#"<ul>
<li><a href="/authors">Browse authors</a></li>
<li><a href="/books">Browse books</a></li>
<li><a href="/swagger-ui">API documentation</a></li>
</ul>"#,
    ))
}

pub async fn author_list(State(state): State<AppState>) -> AppResult<Html<String>> {
    let authors = state
        .services
        .catalog
        .list_authors(&AuthorQuery::default())
        .await?;
    Ok(Html(render_authors(&authors)))
}

pub async fn book_list(State(state): State<AppState>) -> AppResult<Html<String>> {
    let books = state
        .services
        .catalog
        .list_books(&BookQuery::default())
        .await?;
    Ok(Html(render_books(&books)))
}

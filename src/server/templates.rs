//! HTML page builders.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::models::{
    Category, CategorySummary, Document, DocumentWithVariant, Slider, StructuralType, Variant,
    VariantWithCategory,
};
use crate::services::validation::{CategoryForm, FieldErrors, SliderForm, VariantForm};

use super::session::Flash;

/// Escape text for HTML element and attribute content.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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

fn opt(value: &Option<String>) -> String {
    value.as_deref().map(escape).unwrap_or_default()
}

fn format_height(height: f64) -> String {
    if height.fract() == 0.0 {
        format!("{:.0} m", height)
    } else {
        format!("{:.1} m", height)
    }
}

fn render_flashes(flashes: &[Flash]) -> String {
    flashes
        .iter()
        .map(|f| {
            format!(
                r#"<div class="flash flash-{}">{}</div>"#,
                f.level.as_str(),
                escape(&f.message)
            )
        })
        .collect()
}

fn field_error(errors: &FieldErrors, field: &str) -> String {
    errors
        .get(field)
        .map(|e| format!(r#"<div class="field-error">{}</div>"#, escape(e)))
        .unwrap_or_default()
}

fn csrf_input(token: &str) -> String {
    format!(
        r#"<input type="hidden" name="csrf_token" value="{}">"#,
        escape(token)
    )
}

fn delete_button(action: &str, csrf_token: &str, confirm: &str) -> String {
    format!(
        r#"<form method="post" action="{}" onsubmit="return confirm('{}');">{}<button type="submit" class="danger">Delete</button></form>"#,
        escape(action),
        escape(confirm),
        csrf_input(csrf_token)
    )
}

/// Base page layout.
pub fn base_template(title: &str, content: &str, flashes: &[Flash]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - Tower Documentation</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
<header class="site">
    <a class="brand" href="/">Tower Documentation</a>
    <form method="get" action="/search">
        <input type="text" name="q" placeholder="Tower code or type">
        <button type="submit">Search</button>
    </form>
</header>
<main>
{flashes}
{content}
</main>
<footer>Telecommunication tower design catalog</footer>
</body>
</html>"#,
        title = escape(title),
        flashes = render_flashes(flashes),
        content = content,
    )
}

/// Admin page layout with navigation.
pub fn admin_template(title: &str, content: &str, flashes: &[Flash]) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - Admin</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
<header class="site">
    <a class="brand" href="/admin/">Tower Admin</a>
    <nav>
        <a href="/admin/categories">Categories</a>
        <a href="/admin/variants">Variants</a>
        <a href="/admin/documents">Documents</a>
        <a href="/admin/sliders">Sliders</a>
        <a href="/">View site</a>
        <a href="/admin/logout">Log out</a>
    </nav>
</header>
<main>
{flashes}
<h1>{title}</h1>
{content}
</main>
</body>
</html>"#,
        title = escape(title),
        flashes = render_flashes(flashes),
        content = content,
    )
}

pub fn not_found_page() -> String {
    base_template(
        "Not Found",
        r#"<h1>Page not found</h1><p>The page you requested does not exist. <a href="/">Back to the catalog</a>.</p>"#,
        &[],
    )
}

pub fn error_page() -> String {
    base_template(
        "Error",
        r#"<h1>Something went wrong</h1><p>An internal error occurred. Please try again later.</p>"#,
        &[],
    )
}

// ---------------------------------------------------------------------------
// Public pages
// ---------------------------------------------------------------------------

pub fn index_page(
    sliders: &[Slider],
    categories: &[CategorySummary],
    total_variants: u64,
    total_documents: u64,
    total_visits: u64,
) -> String {
    let mut html = String::new();

    if !sliders.is_empty() {
        html.push_str(r#"<section class="slider">"#);
        for slider in sliders {
            let caption = format!(
                r#"<div class="caption"><strong>{}</strong><br>{}</div>"#,
                escape(&slider.title),
                opt(&slider.description)
            );
            let image = format!(
                r#"<img src="{}" alt="{}">"#,
                escape(&slider.image_url),
                escape(&slider.title)
            );
            match &slider.link_url {
                Some(link) => {
                    let _ = write!(
                        html,
                        r#"<a class="slide" href="{}">{}{}</a>"#,
                        escape(link),
                        image,
                        caption
                    );
                }
                None => {
                    let _ = write!(html, r#"<div class="slide">{}{}</div>"#, image, caption);
                }
            }
        }
        html.push_str("</section>");
    }

    let _ = write!(
        html,
        r#"<section class="stats">
    <div class="stat"><div class="value">{}</div><div class="label">Categories</div></div>
    <div class="stat"><div class="value">{}</div><div class="label">Tower variants</div></div>
    <div class="stat"><div class="value">{}</div><div class="label">Documents</div></div>
    <div class="stat"><div class="value">{}</div><div class="label">Visits</div></div>
</section>"#,
        categories.len(),
        total_variants,
        total_documents,
        total_visits
    );

    html.push_str("<h1>Tower categories</h1>");
    if categories.is_empty() {
        html.push_str(r#"<p class="muted">No categories yet.</p>"#);
    } else {
        html.push_str(r#"<div class="grid">"#);
        for summary in categories {
            let category = &summary.category;
            let thumb = category
                .thumbnail_url
                .as_deref()
                .map(|url| format!(r#"<img src="{}" alt="">"#, escape(url)))
                .unwrap_or_default();
            let _ = write!(
                html,
                r#"<div class="card">{}<h3><a href="/category/{}">{}</a></h3><p class="muted">{} variant(s)</p><p>{}</p></div>"#,
                thumb,
                category.id,
                escape(&category.name),
                summary.variant_count,
                opt(&category.description)
            );
        }
        html.push_str("</div>");
    }

    base_template("Home", &html, &[])
}

pub fn category_page(category: &Category, variants: &[Variant]) -> String {
    let mut html = format!(
        r#"<p><a href="/">&larr; All categories</a></p><h1>{}</h1><p>{}</p>"#,
        escape(&category.name),
        opt(&category.description)
    );

    if variants.is_empty() {
        html.push_str(r#"<p class="muted">No variants in this category yet.</p>"#);
    } else {
        html.push_str(
            "<table><thead><tr><th>Tower code</th><th>Height</th><th>Structure</th><th>Load class</th></tr></thead><tbody>",
        );
        for v in variants {
            let _ = write!(
                html,
                r#"<tr><td><a href="/variant/{}">{}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
                v.id,
                escape(&v.tower_code),
                format_height(v.height),
                v.structural_type,
                opt(&v.load_class)
            );
        }
        html.push_str("</tbody></table>");
    }

    base_template(&category.name, &html, &[])
}

pub fn variant_page(item: &VariantWithCategory, document: Option<&Document>) -> String {
    let v = &item.variant;
    let mut html = format!(
        r#"<p><a href="/category/{}">&larr; {}</a></p>
<h1>{}</h1>
<dl class="specs">
    <dt>Height</dt><dd>{}</dd>
    <dt>Structural type</dt><dd>{}</dd>
    <dt>Load class</dt><dd>{}</dd>
    <dt>Engineering notes</dt><dd>{}</dd>
</dl>"#,
        item.category.id,
        escape(&item.category.name),
        escape(&v.tower_code),
        format_height(v.height),
        v.structural_type,
        opt(&v.load_class),
        opt(&v.engineering_notes)
    );

    match document {
        Some(doc) => {
            let _ = write!(
                html,
                r#"<h2>Specification sheet</h2>
<p>Version {} &middot; {} page(s) &middot; {} &middot; uploaded {}</p>
<p><a class="button" href="{}" download>Download PDF</a></p>
<iframe class="pdf" src="{}" title="{}"></iframe>"#,
                escape(&doc.version),
                doc.page_count,
                doc.display_size(),
                doc.upload_timestamp.format("%Y-%m-%d"),
                escape(&doc.pdf_url),
                escape(&doc.pdf_url),
                escape(&v.tower_code)
            );
        }
        None => html.push_str(r#"<p class="muted">No specification sheet is available yet.</p>"#),
    }

    base_template(&v.tower_code, &html, &[])
}

pub fn search_page(query: &str, variants: &[VariantWithCategory], categories: &[Category]) -> String {
    let mut html = format!(r#"<h1>Search results for "{}"</h1>"#, escape(query));

    html.push_str("<h2>Categories</h2>");
    if categories.is_empty() {
        html.push_str(r#"<p class="muted">No matching categories.</p>"#);
    } else {
        html.push_str("<ul>");
        for c in categories {
            let _ = write!(
                html,
                r#"<li><a href="/category/{}">{}</a></li>"#,
                c.id,
                escape(&c.name)
            );
        }
        html.push_str("</ul>");
    }

    html.push_str("<h2>Tower variants</h2>");
    if variants.is_empty() {
        html.push_str(r#"<p class="muted">No matching variants.</p>"#);
    } else {
        html.push_str(
            "<table><thead><tr><th>Tower code</th><th>Category</th><th>Height</th><th>Structure</th></tr></thead><tbody>",
        );
        for item in variants {
            let _ = write!(
                html,
                r#"<tr><td><a href="/variant/{}">{}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
                item.variant.id,
                escape(&item.variant.tower_code),
                escape(&item.category.name),
                format_height(item.variant.height),
                item.variant.structural_type
            );
        }
        html.push_str("</tbody></table>");
    }

    base_template("Search", &html, &[])
}

// ---------------------------------------------------------------------------
// Admin pages
// ---------------------------------------------------------------------------

pub fn login_page(
    flashes: &[Flash],
    csrf_token: &str,
    next: Option<&str>,
    username: &str,
    errors: &FieldErrors,
) -> String {
    let next_input = next
        .map(|n| format!(r#"<input type="hidden" name="next" value="{}">"#, escape(n)))
        .unwrap_or_default();
    let content = format!(
        r#"<h1>Admin login</h1>
<form class="stacked" method="post" action="/admin/login">
    {csrf}{next}
    <label for="username">Username</label>
    <input type="text" id="username" name="username" value="{username}" autofocus>
    {username_error}
    <label for="password">Password</label>
    <input type="password" id="password" name="password">
    {password_error}
    <p><button type="submit">Sign in</button></p>
</form>"#,
        csrf = csrf_input(csrf_token),
        next = next_input,
        username = escape(username),
        username_error = field_error(errors, "username"),
        password_error = field_error(errors, "password"),
    );
    base_template("Admin login", &content, flashes)
}

pub struct DashboardCounts {
    pub categories: u64,
    pub variants: u64,
    pub documents: u64,
    pub visits: u64,
}

pub fn dashboard_page(
    flashes: &[Flash],
    counts: &DashboardCounts,
    recent_categories: &[Category],
    recent_variants: &[VariantWithCategory],
) -> String {
    let mut html = format!(
        r#"<section class="stats">
    <div class="stat"><div class="value">{}</div><div class="label">Categories</div></div>
    <div class="stat"><div class="value">{}</div><div class="label">Variants</div></div>
    <div class="stat"><div class="value">{}</div><div class="label">Documents</div></div>
    <div class="stat"><div class="value">{}</div><div class="label">Visits</div></div>
</section>
<p><a class="button" href="/admin/category/new">New category</a> <a class="button" href="/admin/variant/new">New variant</a></p>"#,
        counts.categories, counts.variants, counts.documents, counts.visits
    );

    html.push_str("<h2>Recent categories</h2><ul>");
    for c in recent_categories {
        let _ = write!(
            html,
            r#"<li><a href="/admin/category/{}/edit">{}</a> <span class="muted">{}</span></li>"#,
            c.id,
            escape(&c.name),
            c.created_at.format("%Y-%m-%d")
        );
    }
    html.push_str("</ul><h2>Recent variants</h2><ul>");
    for item in recent_variants {
        let _ = write!(
            html,
            r#"<li><a href="/admin/variant/{}/edit">{}</a> <span class="muted">{}</span></li>"#,
            item.variant.id,
            escape(&item.variant.tower_code),
            escape(&item.category.name)
        );
    }
    html.push_str("</ul>");

    admin_template("Dashboard", &html, flashes)
}

pub fn categories_admin_page(
    flashes: &[Flash],
    categories: &[CategorySummary],
    csrf_token: &str,
) -> String {
    let mut html = String::from(
        r#"<p><a class="button" href="/admin/category/new">New category</a></p>
<table><thead><tr><th>Name</th><th>Variants</th><th>Created</th><th></th></tr></thead><tbody>"#,
    );
    for summary in categories {
        let c = &summary.category;
        let _ = write!(
            html,
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td class="actions"><a href="/admin/category/{}/edit">Edit</a> {}</td></tr>"#,
            escape(&c.name),
            summary.variant_count,
            c.created_at.format("%Y-%m-%d"),
            c.id,
            delete_button(
                &format!("/admin/category/{}/delete", c.id),
                csrf_token,
                "Delete this category and all of its variants and documents?"
            )
        );
    }
    html.push_str("</tbody></table>");
    admin_template("Categories", &html, flashes)
}

pub fn category_form_page(
    flashes: &[Flash],
    title: &str,
    action: &str,
    form: &CategoryForm,
    errors: &FieldErrors,
    csrf_token: &str,
) -> String {
    let html = format!(
        r#"<form class="stacked" method="post" action="{action}">
    {csrf}
    <label for="name">Category name</label>
    <input type="text" id="name" name="name" value="{name}">
    {name_error}
    <label for="description">Description</label>
    <textarea id="description" name="description">{description}</textarea>
    <label for="thumbnail_url">Thumbnail URL</label>
    <input type="text" id="thumbnail_url" name="thumbnail_url" value="{thumb}">
    <p><button type="submit">Save category</button> <a class="button secondary" href="/admin/categories">Cancel</a></p>
</form>"#,
        action = escape(action),
        csrf = csrf_input(csrf_token),
        name = escape(&form.name),
        name_error = field_error(errors, "name"),
        description = escape(&form.description),
        thumb = escape(&form.thumbnail_url),
    );
    admin_template(title, &html, flashes)
}

pub fn variants_admin_page(
    flashes: &[Flash],
    variants: &[VariantWithCategory],
    document_counts: &HashMap<i32, u64>,
    csrf_token: &str,
) -> String {
    let mut html = String::from(
        r#"<p><a class="button" href="/admin/variant/new">New variant</a></p>
<table><thead><tr><th>Tower code</th><th>Category</th><th>Height</th><th>Structure</th><th>Documents</th><th></th></tr></thead><tbody>"#,
    );
    for item in variants {
        let v = &item.variant;
        let _ = write!(
            html,
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class="actions"><a href="/admin/variant/{}/edit">Edit</a> <a href="/admin/variant/{}/upload">Upload PDF</a> {}</td></tr>"#,
            escape(&v.tower_code),
            escape(&item.category.name),
            format_height(v.height),
            v.structural_type,
            document_counts.get(&v.id).copied().unwrap_or(0),
            v.id,
            v.id,
            delete_button(
                &format!("/admin/variant/{}/delete", v.id),
                csrf_token,
                "Delete this variant and its documents?"
            )
        );
    }
    html.push_str("</tbody></table>");
    admin_template("Variants", &html, flashes)
}

pub fn variant_form_page(
    flashes: &[Flash],
    title: &str,
    action: &str,
    form: &VariantForm,
    categories: &[Category],
    errors: &FieldErrors,
    csrf_token: &str,
) -> String {
    let type_options: String = StructuralType::ALL
        .iter()
        .map(|kind| {
            let selected = if form.structural_type == kind.as_str() { " selected" } else { "" };
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                kind.as_str(),
                selected,
                kind.label()
            )
        })
        .collect();
    let category_options: String = categories
        .iter()
        .map(|c| {
            let selected = if form.category_id.trim() == c.id.to_string() { " selected" } else { "" };
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                c.id,
                selected,
                escape(&c.name)
            )
        })
        .collect();

    let html = format!(
        r#"<form class="stacked" method="post" action="{action}">
    {csrf}
    <label for="tower_code">Tower code</label>
    <input type="text" id="tower_code" name="tower_code" value="{code}">
    {code_error}
    <label for="height">Height (meters)</label>
    <input type="text" id="height" name="height" value="{height}">
    {height_error}
    <label for="structural_type">Structural type</label>
    <select id="structural_type" name="structural_type">{type_options}</select>
    {type_error}
    <label for="load_class">Load class</label>
    <input type="text" id="load_class" name="load_class" value="{load_class}">
    <label for="engineering_notes">Engineering notes</label>
    <textarea id="engineering_notes" name="engineering_notes">{notes}</textarea>
    <label for="category_id">Category</label>
    <select id="category_id" name="category_id">{category_options}</select>
    {category_error}
    <p><button type="submit">Save variant</button> <a class="button secondary" href="/admin/variants">Cancel</a></p>
</form>"#,
        action = escape(action),
        csrf = csrf_input(csrf_token),
        code = escape(&form.tower_code),
        code_error = field_error(errors, "tower_code"),
        height = escape(&form.height),
        height_error = field_error(errors, "height"),
        type_options = type_options,
        type_error = field_error(errors, "structural_type"),
        load_class = escape(&form.load_class),
        notes = escape(&form.engineering_notes),
        category_options = category_options,
        category_error = field_error(errors, "category_id"),
    );
    admin_template(title, &html, flashes)
}

pub fn documents_admin_page(
    flashes: &[Flash],
    documents: &[DocumentWithVariant],
    csrf_token: &str,
) -> String {
    let mut html = String::from(
        r#"<table><thead><tr><th>Variant</th><th>Version</th><th>Pages</th><th>Size</th><th>Uploaded</th><th>Active</th><th></th></tr></thead><tbody>"#,
    );
    for item in documents {
        let d = &item.document;
        let _ = write!(
            html,
            r#"<tr><td><a href="/variant/{}">{}</a></td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td class="actions"><a href="{}">View</a> {}</td></tr>"#,
            d.variant_id,
            escape(&item.tower_code),
            escape(&d.version),
            d.page_count,
            d.display_size(),
            d.upload_timestamp.format("%Y-%m-%d %H:%M"),
            if d.is_active { "Yes" } else { "No" },
            escape(&d.pdf_url),
            delete_button(
                &format!("/admin/document/{}/delete", d.id),
                csrf_token,
                "Delete this document record?"
            )
        );
    }
    html.push_str("</tbody></table>");
    admin_template("Documents", &html, flashes)
}

pub fn upload_form_page(
    flashes: &[Flash],
    variant: &Variant,
    active: Option<&Document>,
    version: &str,
    error: Option<&str>,
    max_upload_mb: u64,
    csrf_token: &str,
) -> String {
    let current = match active {
        Some(doc) => format!(
            r#"<p>Current document: <a href="{}">version {}</a> ({} page(s), {}). Uploading replaces it.</p>"#,
            escape(&doc.pdf_url),
            escape(&doc.version),
            doc.page_count,
            doc.display_size()
        ),
        None => r#"<p class="muted">This variant has no active document.</p>"#.to_string(),
    };
    let error = error
        .map(|e| format!(r#"<div class="field-error">{}</div>"#, escape(e)))
        .unwrap_or_default();

    let html = format!(
        r#"{current}
<form class="stacked" method="post" action="/admin/variant/{id}/upload" enctype="multipart/form-data">
    {csrf}
    <label for="pdf_file">PDF file (max {max} MB)</label>
    <input type="file" id="pdf_file" name="pdf_file" accept="application/pdf,.pdf">
    {error}
    <label for="version">Version</label>
    <input type="text" id="version" name="version" value="{version}">
    <p><button type="submit">Upload document</button> <a class="button secondary" href="/admin/variants">Cancel</a></p>
</form>"#,
        current = current,
        id = variant.id,
        csrf = csrf_input(csrf_token),
        max = max_upload_mb,
        error = error,
        version = escape(version),
    );
    admin_template(&format!("Upload PDF for {}", variant.tower_code), &html, flashes)
}

pub fn sliders_admin_page(flashes: &[Flash], sliders: &[Slider], csrf_token: &str) -> String {
    let mut html = String::from(
        r#"<p><a class="button" href="/admin/slider/new">New slider</a></p>
<table><thead><tr><th>Order</th><th>Title</th><th>Image</th><th>Active</th><th></th></tr></thead><tbody>"#,
    );
    for s in sliders {
        let _ = write!(
            html,
            r#"<tr><td>{}</td><td>{}</td><td><a href="{}">image</a></td><td>{}</td><td class="actions"><a href="/admin/slider/{}/edit">Edit</a> {}</td></tr>"#,
            s.display_order,
            escape(&s.title),
            escape(&s.image_url),
            if s.is_active { "Yes" } else { "No" },
            s.id,
            delete_button(
                &format!("/admin/slider/{}/delete", s.id),
                csrf_token,
                "Delete this slider?"
            )
        );
    }
    html.push_str("</tbody></table>");
    admin_template("Sliders", &html, flashes)
}

pub fn slider_form_page(
    flashes: &[Flash],
    title: &str,
    action: &str,
    form: &SliderForm,
    errors: &FieldErrors,
    csrf_token: &str,
) -> String {
    let html = format!(
        r#"<form class="stacked" method="post" action="{action}">
    {csrf}
    <label for="title">Title</label>
    <input type="text" id="title" name="title" value="{title}">
    {title_error}
    <label for="description">Description</label>
    <textarea id="description" name="description">{description}</textarea>
    <label for="image_url">Image URL</label>
    <input type="url" id="image_url" name="image_url" value="{image_url}">
    {image_error}
    <label for="link_url">Link URL</label>
    <input type="url" id="link_url" name="link_url" value="{link_url}">
    {link_error}
    <label for="order">Display order</label>
    <input type="number" id="order" name="order" min="0" value="{order}">
    {order_error}
    <label><input type="checkbox" name="is_active" value="on"{checked}> Active</label>
    <p><button type="submit">Save slider</button> <a class="button secondary" href="/admin/sliders">Cancel</a></p>
</form>"#,
        action = escape(action),
        csrf = csrf_input(csrf_token),
        title = escape(&form.title),
        title_error = field_error(errors, "title"),
        description = escape(&form.description),
        image_url = escape(&form.image_url),
        image_error = field_error(errors, "image_url"),
        link_url = escape(&form.link_url),
        link_error = field_error(errors, "link_url"),
        order = escape(&form.order),
        order_error = field_error(errors, "order"),
        checked = if form.is_active() { " checked" } else { "" },
    );
    admin_template(title, &html, flashes)
}

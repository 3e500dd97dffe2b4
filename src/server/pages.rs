use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::record::ProductRecord;

const STYLE: &str = r#"
*{margin:0;padding:0;box-sizing:border-box;}
body{font-family:-apple-system,BlinkMacSystemFont,'Segoe UI',Roboto,sans-serif;background:#f5f7fa;color:#111827;}
.header{background:#fff;border-bottom:1px solid #e5e7eb;padding:16px 32px;display:flex;align-items:center;gap:12px;}
.header-title{font-size:16px;font-weight:600;}
.header form{margin-left:auto;}
.container{max-width:960px;margin:0 auto;padding:32px;}
h1{font-size:24px;margin-bottom:8px;}
.muted{font-size:14px;color:#6b7280;margin-bottom:24px;}
.card{background:#fff;border:1px solid #e5e7eb;border-radius:8px;padding:24px;margin-bottom:24px;}
.alert{background:#fef3c7;border:1px solid #fbbf24;border-radius:6px;padding:12px 16px;margin-bottom:24px;font-size:13px;color:#92400e;}
label{display:block;font-size:14px;font-weight:500;margin-bottom:8px;}
input,textarea{width:100%;padding:10px;border:1px solid #d1d5db;border-radius:6px;font-size:13px;margin-bottom:12px;}
textarea{min-height:200px;font-family:monospace;}
.btn{display:inline-block;padding:10px 20px;border:none;border-radius:6px;background:#6366f1;color:#fff;font-size:14px;cursor:pointer;text-decoration:none;}
.btn-link{background:none;color:#6b7280;padding:0;}
.product{border-left:4px solid #6366f1;padding:12px 16px;margin-bottom:12px;background:#f9fafb;border-radius:6px;}
.product.error{border-left-color:#e74c3c;}
.sku{font-family:monospace;font-size:12px;color:#6366f1;}
.price{font-weight:600;color:#047857;}
.url{font-family:monospace;font-size:12px;color:#9ca3af;word-break:break-all;}
"#;

fn layout(title: &str, user: Option<&str>, content: &str) -> String {
    let logout = match user {
        Some(u) => format!(
            r#"<form method="POST" action="/logout"><span class="muted">{}</span> <button class="btn btn-link" type="submit">Log out</button></form>"#,
            text(u)
        ),
        None => String::new(),
    };
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{STYLE}</style>
</head>
<body>
<div class="header"><div class="header-title">Product Scraper</div>{logout}</div>
<div class="container">
{content}
</div>
</body>
</html>"#,
        title = text(title),
    )
}

pub fn login(error: Option<&str>) -> String {
    let alert = error
        .map(|e| format!(r#"<div class="alert">{}</div>"#, text(e)))
        .unwrap_or_default();
    let content = format!(
        r#"<h1>Sign in</h1>
<p class="muted">Authorized users only.</p>
{alert}
<div class="card">
<form method="POST" action="/login">
<label for="username">Username</label>
<input id="username" name="username" autocomplete="username" required>
<label for="password">Password</label>
<input id="password" name="password" type="password" autocomplete="current-password" required>
<button class="btn" type="submit">Sign in</button>
</form>
</div>"#
    );
    layout("Sign in - Product Scraper", None, &content)
}

pub fn index(user: &str) -> String {
    let content = r#"<h1>Product Scraper</h1>
<p class="muted">Extract product information from e-commerce URLs.</p>
<div class="alert">Amazon URLs are not supported and will be skipped.</div>
<div class="card">
<form method="POST" action="/scrape">
<label for="urls">Product URLs (one per line)</label>
<textarea id="urls" name="urls" placeholder="https://www.shop.example/products/example-product"></textarea>
<button class="btn" type="submit">Start Scraping</button>
</form>
</div>"#;
    layout("Product Scraper", Some(user), content)
}

pub fn error(user: &str, heading: &str, message: &str) -> String {
    let content = format!(
        r#"<h1>{}</h1>
<div class="card"><p>{}</p></div>
<a class="btn" href="/">Back</a>"#,
        text(heading),
        text(message)
    );
    layout(heading, Some(user), &content)
}

pub fn results(user: &str, records: &[ProductRecord], skipped: &[String], file_name: &str) -> String {
    let count = records.len();
    let plural = if count == 1 { "" } else { "s" };
    let skipped_note = if skipped.is_empty() {
        String::new()
    } else {
        format!(
            r#"<div class="alert">{} Amazon URL(s) were skipped (not supported).</div>"#,
            skipped.len()
        )
    };
    let items: String = records.iter().map(preview).collect();

    let content = format!(
        r#"<h1>Scraped {count} product{plural}</h1>
{skipped_note}
<div class="card">
<p class="muted">{file}</p>
<a class="btn" href="/download/{href}" download>Download CSV</a>
</div>
<div class="card">
{items}
</div>
<a class="btn" href="/">Scrape more products</a>"#,
        file = text(file_name),
        href = attr(file_name),
    );
    layout("Scraping results", Some(user), &content)
}

fn preview(p: &ProductRecord) -> String {
    let name: String = p.product_name.chars().take(100).collect();
    let url: String = p.product_url.chars().take(120).collect();
    let ellipsis = if p.product_url.chars().count() > 120 { "..." } else { "" };
    let price = if p.variant_price.is_empty() {
        String::new()
    } else {
        format!(r#"<div class="price">${}</div>"#, text(&p.variant_price))
    };
    format!(
        r#"<div class="product{cls}"><div><strong>{name}</strong> <span class="sku">{sku}</span></div>{price}<div class="url">{url}{ellipsis}</div></div>
"#,
        cls = if p.is_error() { " error" } else { "" },
        name = text(&name),
        sku = text(&p.sku),
        url = text(&url),
    )
}

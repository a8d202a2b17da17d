//! Page templates, embedded at build time and loaded into one `Tera`.

use rust_embed::RustEmbed;
use std::collections::HashMap;
use tera::{Tera, Value};

use crate::catalog::pricing::format_price;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct TemplateAssets;

/// `{{ t(key="nav.plans", locale=locale) }}`
fn translate(args: &HashMap<String, Value>) -> tera::Result<Value> {
    let key = args
        .get("key")
        .and_then(Value::as_str)
        .ok_or_else(|| tera::Error::msg("t() requires a `key` argument"))?;
    let locale = args.get("locale").and_then(Value::as_str).unwrap_or("en");
    Ok(Value::String(t!(key, locale = locale).into_owned()))
}

/// `{{ plan.price_monthly | price(currency=plan.currency) }}`
fn price_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let amount = value
        .as_f64()
        .ok_or_else(|| tera::Error::msg("price filter expects a number"))?;
    let currency = args.get("currency").and_then(Value::as_str).unwrap_or("IDR");
    Ok(Value::String(format_price(amount, currency)))
}

pub fn load_templates() -> Result<Tera, tera::Error> {
    let mut sources = Vec::new();
    for name in TemplateAssets::iter() {
        if let Some(file) = TemplateAssets::get(&name) {
            let body = String::from_utf8_lossy(&file.data).into_owned();
            sources.push((name.to_string(), body));
        }
    }

    let mut tera = Tera::default();
    tera.add_raw_templates(sources)?;
    tera.register_function("t", translate);
    tera.register_filter("price", price_filter);
    Ok(tera)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_templates_parse() {
        let tera = load_templates().unwrap();
        assert!(tera.get_template_names().any(|name| name == "base.html"));
        assert!(tera.get_template_names().any(|name| name == "auth/reset_invalid.html"));
    }

    #[test]
    fn test_price_filter() {
        let formatted = price_filter(
            &Value::from(2_550_000.0),
            &HashMap::from([("currency".to_string(), Value::from("IDR"))]),
        )
        .unwrap();
        assert_eq!(formatted, Value::from("IDR 2,550,000"));
    }

    #[test]
    fn test_translate_uses_locale() {
        let args = |locale: &str| {
            HashMap::from([
                ("key".to_string(), Value::from("nav.plans")),
                ("locale".to_string(), Value::from(locale)),
            ])
        };
        assert_eq!(translate(&args("en")).unwrap(), Value::from("Plans"));
        assert_eq!(translate(&args("id")).unwrap(), Value::from("Paket"));
    }
}

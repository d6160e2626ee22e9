//! Shop links attached to every verdict.

use crate::evaluator::verdict::SuggestedLink;
use crate::product::{Category, ProductSpec};
use crate::rules::Routes;

fn has(category: Category, a: &ProductSpec, b: &ProductSpec) -> bool {
    a.category == Some(category) || b.category == Some(category)
}

/// `?brand=..&family=..` from the panel's identity, empty when unknown
fn panel_query(a: &ProductSpec, b: &ProductSpec) -> String {
    let Some(panel) = [a, b].into_iter().find(|s| s.category == Some(Category::Panel)) else {
        return String::new();
    };
    let mut params = Vec::new();
    if let Some(ref brand) = panel.brand {
        params.push(format!("brand={}", urlencoding::encode(brand)));
    }
    if let Some(ref series) = panel.series {
        params.push(format!("family={}", urlencoding::encode(series)));
    }
    if params.is_empty() {
        String::new()
    } else {
        format!("?{}", params.join("&"))
    }
}

fn push(links: &mut Vec<SuggestedLink>, label: &str, base: Option<&String>, query: &str) {
    if let Some(base) = base {
        links.push(SuggestedLink {
            label: label.to_string(),
            url: format!("{}{}", base, query),
        });
    }
}

/// Links relevant to a pair's categories; routes missing from the rules file are skipped
pub fn suggest_links(routes: &Routes, a: &ProductSpec, b: &ProductSpec) -> Vec<SuggestedLink> {
    let mut links = Vec::new();
    let panel = has(Category::Panel, a, b);
    let breaker = has(Category::Breaker, a, b);

    if panel || breaker {
        let query = panel_query(a, b);
        push(&mut links, "Shop compatible breakers", routes.breakers.as_ref(), &query);
        push(&mut links, "Shop matching panels", routes.panels.as_ref(), &query);
    }
    if has(Category::Plug, a, b) {
        push(&mut links, "Shop matching receptacles", routes.receptacles.as_ref(), "");
    }
    if has(Category::Receptacle, a, b) {
        push(&mut links, "Shop matching plugs", routes.plugs.as_ref(), "");
    }
    if has(Category::EvCharger, a, b) {
        push(&mut links, "Shop EV chargers", routes.ev.as_ref(), "");
    }
    if panel {
        push(&mut links, "Shop panel accessories", routes.accessories.as_ref(), "");
    }
    if has(Category::Enclosure, a, b) || has(Category::Site, a, b) {
        push(&mut links, "Shop rated enclosures", routes.enclosures.as_ref(), "");
    }
    links
}

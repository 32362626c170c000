//! Public page registry: SEO metadata, sitemap, robots and schema.org markup.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

pub const BRAND_NAME: &str = "Patrimonio Advisory";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFrequency {
    Weekly,
    Monthly,
    Yearly,
}

impl ChangeFrequency {
    fn as_str(&self) -> &'static str {
        match self {
            ChangeFrequency::Weekly => "weekly",
            ChangeFrequency::Monthly => "monthly",
            ChangeFrequency::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Page {
    pub slug: &'static str,
    pub path: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub priority: f32,
    pub change_frequency: ChangeFrequency,
}

pub const PAGES: &[Page] = &[
    Page {
        slug: "home",
        path: "/",
        title: "Patrimonio Advisory | Consulenza patrimoniale indipendente",
        description: "Consulenza finanziaria indipendente per famiglie e imprenditori: pianificazione, previdenza, fiscalità e passaggio generazionale.",
        priority: 1.0,
        change_frequency: ChangeFrequency::Weekly,
    },
    Page {
        slug: "chi-siamo",
        path: "/chi-siamo",
        title: "Chi siamo | Patrimonio Advisory",
        description: "Il nostro metodo, i consulenti e i principi che guidano ogni mandato.",
        priority: 0.7,
        change_frequency: ChangeFrequency::Yearly,
    },
    Page {
        slug: "servizi",
        path: "/servizi",
        title: "Servizi di consulenza | Patrimonio Advisory",
        description: "Pianificazione patrimoniale, consulenza previdenziale, immobiliare di pregio e gestione del passaggio generazionale.",
        priority: 0.9,
        change_frequency: ChangeFrequency::Monthly,
    },
    Page {
        slug: "strumenti",
        path: "/strumenti",
        title: "Strumenti e calcolatori finanziari | Patrimonio Advisory",
        description: "Calcolatori gratuiti per interesse composto, mutuo, IRPEF e indicatori macroeconomici aggiornati.",
        priority: 0.8,
        change_frequency: ChangeFrequency::Weekly,
    },
    Page {
        slug: "interesse-composto",
        path: "/strumenti/interesse-composto",
        title: "Calcolatore di interesse composto e PAC | Patrimonio Advisory",
        description: "Simula la crescita di un capitale iniziale e di un piano di accumulo mensile nel tempo.",
        priority: 0.7,
        change_frequency: ChangeFrequency::Monthly,
    },
    Page {
        slug: "mutuo",
        path: "/strumenti/mutuo",
        title: "Calcolatore mutuo con piano di ammortamento | Patrimonio Advisory",
        description: "Calcola la rata del mutuo a tasso fisso e il piano di ammortamento alla francese.",
        priority: 0.7,
        change_frequency: ChangeFrequency::Monthly,
    },
    Page {
        slug: "irpef",
        path: "/strumenti/irpef",
        title: "Calcolatore IRPEF | Patrimonio Advisory",
        description: "Stima l'IRPEF lorda per scaglioni, l'aliquota media e l'aliquota marginale.",
        priority: 0.7,
        change_frequency: ChangeFrequency::Yearly,
    },
    Page {
        slug: "indicatori",
        path: "/strumenti/indicatori",
        title: "Tassi BCE, BTP, inflazione e immobiliare di pregio | Patrimonio Advisory",
        description: "Tassi della BCE, rendimento del BTP decennale e spread, inflazione ISTAT e prezzi dell'immobiliare di lusso.",
        priority: 0.8,
        change_frequency: ChangeFrequency::Weekly,
    },
    Page {
        slug: "consulente-ai",
        path: "/consulente-ai",
        title: "Consulente virtuale | Patrimonio Advisory",
        description: "Fai una domanda su previdenza, fiscalità o investimenti al nostro assistente virtuale.",
        priority: 0.6,
        change_frequency: ChangeFrequency::Monthly,
    },
    Page {
        slug: "contatti",
        path: "/contatti",
        title: "Contatti | Patrimonio Advisory",
        description: "Prenota una consulenza conoscitiva gratuita con uno dei nostri consulenti.",
        priority: 0.8,
        change_frequency: ChangeFrequency::Yearly,
    },
    Page {
        slug: "privacy",
        path: "/privacy",
        title: "Informativa privacy | Patrimonio Advisory",
        description: "Informativa sul trattamento dei dati personali ai sensi del GDPR.",
        priority: 0.2,
        change_frequency: ChangeFrequency::Yearly,
    },
    Page {
        slug: "cookie-policy",
        path: "/cookie-policy",
        title: "Cookie policy | Patrimonio Advisory",
        description: "Informazioni sui cookie tecnici e di analisi utilizzati dal sito.",
        priority: 0.2,
        change_frequency: ChangeFrequency::Yearly,
    },
];

pub fn find_page(slug: &str) -> Option<&'static Page> {
    PAGES.iter().find(|p| p.slug == slug)
}

pub fn canonical_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if path == "/" {
        format!("{base}/")
    } else {
        format!("{base}{path}")
    }
}

/// schema.org markup for a page: the organization on the home page, a plain
/// `WebPage` linked to it everywhere else.
pub fn page_json_ld(base_url: &str, page: &Page) -> Value {
    let url = canonical_url(base_url, page.path);
    let organization = json!({
        "@type": "FinancialService",
        "@id": format!("{}#organization", canonical_url(base_url, "/")),
        "name": BRAND_NAME,
        "url": canonical_url(base_url, "/"),
        "areaServed": "IT",
        "knowsLanguage": "it",
    });

    if page.slug == "home" {
        let mut org = organization;
        org["@context"] = json!("https://schema.org");
        org["description"] = json!(page.description);
        return org;
    }

    json!({
        "@context": "https://schema.org",
        "@type": "WebPage",
        "name": page.title,
        "description": page.description,
        "url": url,
        "inLanguage": "it-IT",
        "publisher": organization,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub path: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub canonical: String,
    pub json_ld: Value,
}

pub fn page_metadata(base_url: &str, page: &'static Page) -> PageMetadata {
    PageMetadata {
        path: page.path,
        title: page.title,
        description: page.description,
        canonical: canonical_url(base_url, page.path),
        json_ld: page_json_ld(base_url, page),
    }
}

pub fn render_sitemap(base_url: &str, lastmod: NaiveDate) -> String {
    let mut out = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for page in PAGES {
        out.push_str(&format!(
            "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    <changefreq>{}</changefreq>\n    <priority>{:.1}</priority>\n  </url>\n",
            xml_escape(&canonical_url(base_url, page.path)),
            lastmod.format("%Y-%m-%d"),
            page.change_frequency.as_str(),
            page.priority
        ));
    }
    out.push_str("</urlset>\n");
    out
}

pub fn render_robots(base_url: &str) -> String {
    format!(
        "User-agent: *\nAllow: /\nDisallow: /api/\n\nSitemap: {}\n",
        canonical_url(base_url, "/sitemap.xml")
    )
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const BASE: &str = "https://example.it";

    #[test]
    fn slugs_and_paths_are_unique() {
        let slugs: HashSet<_> = PAGES.iter().map(|p| p.slug).collect();
        let paths: HashSet<_> = PAGES.iter().map(|p| p.path).collect();
        assert_eq!(slugs.len(), PAGES.len());
        assert_eq!(paths.len(), PAGES.len());
    }

    #[test]
    fn sitemap_lists_every_page() {
        let xml = render_sitemap(BASE, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        assert_eq!(xml.matches("<url>").count(), PAGES.len());
        assert!(xml.contains("<loc>https://example.it/</loc>"));
        assert!(xml.contains("<loc>https://example.it/strumenti/mutuo</loc>"));
        assert!(xml.contains("<lastmod>2026-10-16</lastmod>"));
        assert!(xml.contains("<priority>1.0</priority>"));
    }

    #[test]
    fn robots_points_at_sitemap() {
        let robots = render_robots("https://example.it/");
        assert!(robots.contains("Disallow: /api/"));
        assert!(robots.ends_with("Sitemap: https://example.it/sitemap.xml\n"));
    }

    #[test]
    fn home_page_carries_organization_schema() {
        let ld = page_json_ld(BASE, find_page("home").unwrap());
        assert_eq!(ld["@type"], "FinancialService");
        assert_eq!(ld["name"], BRAND_NAME);
        assert_eq!(ld["@context"], "https://schema.org");
    }

    #[test]
    fn inner_pages_reference_publisher() {
        let meta = page_metadata(BASE, find_page("irpef").unwrap());
        assert_eq!(meta.canonical, "https://example.it/strumenti/irpef");
        assert_eq!(meta.json_ld["@type"], "WebPage");
        assert_eq!(meta.json_ld["publisher"]["@id"], "https://example.it/#organization");
    }
}

//! Default content shipped inside the binary.
//!
//! This is the last tier of the content chain: it is built from literals and
//! cannot fail.

use crate::content::{
    Address, CompanyInfo, ContactInfo, ContentBundle, HeroSection, Problem, Product,
    ProductCatalog, SiteConfig, SocialLinks, Theme,
};

impl ContentBundle {
    /// The bundled default content.
    #[must_use]
    pub fn bundled() -> Self {
        Self::from_sections(site_config(), problems(), products())
    }
}

fn site_config() -> SiteConfig {
    SiteConfig {
        company: CompanyInfo {
            name: "Hausset".to_string(),
            tagline: "One organized hub, home troubles vanished".to_string(),
            description: "Transform your home management with smart organization and proactive maintenance tracking".to_string(),
            logo: Some("/hausset-icon.png".to_string()),
            launch_date: Some("2025".to_string()),
            extra: Default::default(),
        },
        hero: HeroSection {
            title: "Hausset".to_string(),
            subtitle: "One organized hub, home troubles vanished".to_string(),
            description: "Reactive Approach to Home Maintenance is Dangerous and Costly".to_string(),
            cta_text: "Get Early Access".to_string(),
            cta_link: "#contact".to_string(),
            background_image: Some("/hero-bg.jpg".to_string()),
            extra: Default::default(),
        },
        contact: Some(ContactInfo {
            email: "hello@calyptor.net".to_string(),
            phone: Some("+1 (267) 319-9196".to_string()),
            address: Some(Address {
                street: "2108 N ST STE N".to_string(),
                city: "Sacramento".to_string(),
                state: "CA".to_string(),
                zip: "95816".to_string(),
                extra: Default::default(),
            }),
            extra: Default::default(),
        }),
        social: Some(SocialLinks {
            twitter: Some("https://x.com/Hausset_app".to_string()),
            email: Some("hello@calyptor.net".to_string()),
            other: Default::default(),
        }),
        theme: Theme::default(),
        extra: Default::default(),
    }
}

fn problem(id: &str, title: &str, description: &str, stat: &str, quote: &str) -> Problem {
    Problem {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        stat: Some(stat.to_string()),
        quote: Some(quote.to_string()),
        background_image: Some(format!("/{id}-bg.jpg")),
        extra: Default::default(),
    }
}

fn problems() -> Vec<Problem> {
    vec![
        problem(
            "awareness",
            "Lack of Awareness",
            "Homeowners often aren't aware of the installations and systems in their homes",
            "40% of U.S. homes (~35M) have at least one health or safety hazard",
            "Most people only discover problems when it's too late",
        ),
        problem(
            "reactive",
            "Reactive Mindset",
            "People take action mostly when damages have been done, with no preventive records",
            "125,700 deaths annually from home accidents",
            "Emergency repairs cost 3-5x more than preventive maintenance",
        ),
        problem(
            "costs",
            "High Costs & Risks",
            "Reactive approach leads to health risks, higher costs, and property degradation",
            "$200B+ in U.S. residential urgent repairs annually",
            "Average household emergency repair cost: $2,920",
        ),
    ]
}

fn product(id: &str, title: &str, description: &str, features: [&str; 4]) -> Product {
    Product {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        features: Some(features.iter().map(|f| (*f).to_string()).collect()),
        image: Some(format!("/images/screenshots/{id}.png")),
        extra: Default::default(),
    }
}

fn products() -> ProductCatalog {
    ProductCatalog::List(vec![
        product(
            "home-dashboard",
            "Home Dashboard",
            "Track your home's health score, assets, and upcoming maintenance",
            [
                "Real-time health scoring",
                "Asset tracking",
                "Warranty management",
                "Maintenance alerts",
            ],
        ),
        product(
            "asset-detail",
            "Asset Management",
            "Detailed view of each home asset with photos, warranties, and service history",
            [
                "Photo documentation",
                "Warranty tracking",
                "Service schedules",
                "Value monitoring",
            ],
        ),
        product(
            "analytics",
            "Analytics & Insights",
            "Understand your spending, track improvements, and plan maintenance",
            [
                "Spending analytics",
                "Health trends",
                "Maintenance planning",
                "Cost predictions",
            ],
        ),
    ])
}

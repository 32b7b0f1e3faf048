//! Sample catalog used when `catalog.seed_demo` is enabled.

use chrono::{DateTime, TimeZone, Utc};

use crate::draft::EventDraft;

fn at(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn demo_drafts() -> Vec<EventDraft> {
    vec![
        EventDraft {
            title: "Starlight Music Festival".to_string(),
            description: "An unforgettable night under the stars with the world's top electronic music artists. Featuring a dazzling light show and immersive soundscapes.".to_string(),
            starts_at: at(2024, 9, 15, 19),
            location: "Echo Canyon Amphitheater".to_string(),
            price_cents: 7500,
            total_tickets: 5000,
            image_url: "https://picsum.photos/seed/music/600/400".to_string(),
        },
        EventDraft {
            title: "Future of Tech Summit".to_string(),
            description: "Join industry leaders and visionaries to explore the next wave of technological innovation, from AI to quantum computing.".to_string(),
            starts_at: at(2024, 10, 22, 9),
            location: "Metropolis Convention Center".to_string(),
            price_cents: 19999,
            total_tickets: 1500,
            image_url: "https://picsum.photos/seed/tech/600/400".to_string(),
        },
        EventDraft {
            title: "Culinary Masters Cook-Off".to_string(),
            description: "Watch celebrity chefs battle it out in a live cooking competition. Sample exquisite dishes and learn new techniques.".to_string(),
            starts_at: at(2024, 11, 5, 18),
            location: "Grand Plaza Ballroom".to_string(),
            price_cents: 12000,
            total_tickets: 300,
            image_url: "https://picsum.photos/seed/food/600/400".to_string(),
        },
        EventDraft {
            title: "Indie Film Showcase".to_string(),
            description: "A curated selection of the best independent films of the year, followed by Q&A sessions with the directors.".to_string(),
            starts_at: at(2024, 11, 18, 17),
            location: "The Royal Cinema".to_string(),
            price_cents: 2500,
            total_tickets: 250,
            image_url: "https://picsum.photos/seed/film/600/400".to_string(),
        },
    ]
}

//! Static copy rendered by the marketing pages.

/// One entry of the changelog page.
#[derive(Debug)]
pub struct Release {
    pub version: &'static str,
    pub date: &'static str,
    pub summary: &'static str,
    pub highlights: &'static [&'static str],
}

/// One support question.
#[derive(Debug)]
pub struct Faq {
    pub question: &'static str,
    pub answer: &'static str,
}

/// App version shown in the footer.
pub const APP_VERSION: &str = "1.3.3";

/// Support mailbox.
pub const SUPPORT_EMAIL: &str = "support@nextquest.dev";

/// Newest first.
pub const RELEASES: &[Release] = &[
    Release {
        version: "1.1.1",
        date: "2025-10-06",
        summary: "Enhanced Discovery & Smooth Navigation",
        highlights: &[
            "Added comprehensive themes filtering (Horror, Fantasy, Sci-Fi, etc.)",
            "Implemented infinite scroll for seamless browsing",
            "Enhanced personal ratings filtering with intuitive range sliders",
            "Added scroll-to-top functionality for better navigation",
            "Improved loading animations and visual consistency",
        ],
    },
    Release {
        version: "1.1.0",
        date: "2025-09",
        summary: "Game Lists & Enhanced Profiles",
        highlights: &[
            "Custom game lists with sharing capabilities",
            "One-year device sessions (stay logged in)",
            "User profiles with roles and avatars",
            "Upvote/downvote system for lists",
        ],
    },
    Release {
        version: "1.0.7",
        date: "2025-08",
        summary: "Themes & Discovery",
        highlights: &[
            "Light/Dark theme system",
            "Similar games discovery",
            "Rating count displays",
        ],
    },
    Release {
        version: "1.0.6",
        date: "2025-07",
        summary: "Advanced Search & Navigation",
        highlights: &[
            "Advanced search with Steam/IGDB metrics",
            "Configurable status pill positioning",
            "Modern bottom tab navigation",
        ],
    },
    Release {
        version: "1.0.5",
        date: "2025-06",
        summary: "First iOS Release",
        highlights: &[
            "First iOS release",
            "FlashList performance optimization",
            "Multi-platform game tracking",
        ],
    },
];

pub const FAQS: &[Faq] = &[
    Faq {
        question: "How do I back up or sync my data?",
        answer: "NextQuest automatically syncs your data when you sign in with Google or Apple. \
                 Your game library, notes, and lists are stored securely in the cloud and sync \
                 across all your devices. Make sure you're signed in to ensure your data is backed up.",
    },
    Faq {
        question: "Does NextQuest require an account?",
        answer: "An account is required to sync your data across devices and access cloud \
                 features. You can sign in with Google or Apple for a seamless experience. \
                 However, you can browse public lists without an account.",
    },
    Faq {
        question: "How do I report a bug?",
        answer: "Please email us at support@nextquest.dev with details about the issue. Include \
                 your device model, OS version, app version, and steps to reproduce the bug. You \
                 can also report issues on our GitHub repository.",
    },
    Faq {
        question: "How do I request a feature?",
        answer: "We welcome feature requests! Email us at support@nextquest.dev or open an issue \
                 on our GitHub repository. Please describe the feature and how it would improve \
                 your experience.",
    },
    Faq {
        question: "Can I use NextQuest offline?",
        answer: "Yes, you can view your local game library offline. However, features like \
                 search, syncing, and accessing new game data require an internet connection. \
                 Your data is cached locally for offline viewing.",
    },
    Faq {
        question: "How do I create a custom list?",
        answer: "Navigate to the Lists tab, tap the \"+\" button, and give your list a name and \
                 description. You can add games, customize the appearance, and choose visibility \
                 settings (Public, Unlisted, or Private).",
    },
];

//! Keyword-rule intent routing for chat messages.
//!
//! Rules are evaluated in order and the first match wins. Matching is plain
//! case-insensitive substring search over the whole message, so short
//! keywords such as "hi" or "or" also fire inside longer words.

use tracing::debug;

use shopdb_core::price::ConstraintParser;
use shopdb_core::types::{PriceConstraint, QueryIntent};
use shopdb_text::infer_category;

pub const GREETING_REPLY: &str = "Hello. How may I assist you with product search or questions today?";
pub const FAREWELL_REPLY: &str = "Goodbye. If you need further assistance, please ask anytime.";
pub const THANKS_REPLY: &str = "You're welcome. Would you like help with anything else?";
pub const HELP_REPLY: &str = "I can help you find products, filter by price, or compare items. \
For example: 'Show me Dell laptops with 16GB RAM under 80000'.";
pub const IDENTITY_REPLY: &str =
    "I am a product search assistant that helps locate and compare electronics from the available dataset.";
pub const PRODUCT_REPLY: &str = "Here are the most relevant products matching your query:";

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey"];
const FAREWELL_WORDS: &[&str] = &["bye", "goodbye", "see you"];
const THANKS_WORDS: &[&str] = &["thank", "thanks", "appreciate"];
const HELP_WORDS: &[&str] = &["help", "guide", "what can you do"];
const IDENTITY_WORDS: &[&str] = &["who are you", "what are you"];
const PRODUCT_WORDS: &[&str] = &[
    "phone", "mobile", "laptop", "computer", "headphone", "earphone", "gaming", "show", "find", "search", "looking for",
    "compare", "vs", "or", "under", "budget", "price", "cost", "how much", "cheap", "expensive",
];

/// Greetings only count for short messages ("hi there", not "hi, find me a laptop").
const GREETING_MAX_TOKENS: usize = 3;

fn contains_any(message: &str, words: &[&str]) -> bool {
    words.iter().any(|w| message.contains(w))
}

fn is_greeting(m: &str) -> bool {
    contains_any(m, GREETING_WORDS) && m.split_whitespace().count() < GREETING_MAX_TOKENS
}

fn is_farewell(m: &str) -> bool {
    contains_any(m, FAREWELL_WORDS)
}

fn is_thanks(m: &str) -> bool {
    contains_any(m, THANKS_WORDS)
}

fn is_help(m: &str) -> bool {
    contains_any(m, HELP_WORDS)
}

fn is_identity(m: &str) -> bool {
    contains_any(m, IDENTITY_WORDS)
}

fn is_product(m: &str) -> bool {
    contains_any(m, PRODUCT_WORDS)
}

/// One routing rule. `reply` is set for the canned conversational intents.
struct Rule {
    intent: QueryIntent,
    matches: fn(&str) -> bool,
    reply: Option<&'static str>,
}

const RULES: &[Rule] = &[
    Rule { intent: QueryIntent::Greeting, matches: is_greeting, reply: Some(GREETING_REPLY) },
    Rule { intent: QueryIntent::Farewell, matches: is_farewell, reply: Some(FAREWELL_REPLY) },
    Rule { intent: QueryIntent::Thanks, matches: is_thanks, reply: Some(THANKS_REPLY) },
    Rule { intent: QueryIntent::HelpRequest, matches: is_help, reply: Some(HELP_REPLY) },
    Rule { intent: QueryIntent::IdentityQuestion, matches: is_identity, reply: Some(IDENTITY_REPLY) },
    Rule { intent: QueryIntent::ProductQuery, matches: is_product, reply: None },
];

/// What the caller should do with a routed message.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Answer with a fixed string.
    Canned(&'static str),
    /// Query the catalog; degrade to the fallback responder on zero hits.
    Catalog { price: PriceConstraint, category: Option<&'static str>, top_k: usize },
    /// Forward `prompt` to the fallback responder.
    Fallback { prompt: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub intent: QueryIntent,
    pub dispatch: Dispatch,
}

/// Prompt sent to the fallback responder when a product query finds nothing.
pub fn no_match_prompt(message: &str) -> String {
    format!(
        "I could not find matching products in the store for the following query: '{message}'. \
         Please provide general guidance based on product knowledge: {message}"
    )
}

#[derive(Debug, Clone, Copy)]
pub struct IntentRouter {
    parser: ConstraintParser,
    top_k: usize,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new(ConstraintParser::default(), 3)
    }
}

impl IntentRouter {
    pub fn new(parser: ConstraintParser, top_k: usize) -> Self {
        Self { parser, top_k }
    }

    fn first_rule(message: &str) -> Option<&'static Rule> {
        let m = message.trim().to_lowercase();
        RULES.iter().find(|r| (r.matches)(&m))
    }

    pub fn classify(&self, message: &str) -> QueryIntent {
        Self::first_rule(message).map_or(QueryIntent::GeneralOther, |r| r.intent)
    }

    pub fn route(&self, message: &str) -> Route {
        let route = match Self::first_rule(message) {
            Some(Rule { intent, reply: Some(reply), .. }) => {
                Route { intent: *intent, dispatch: Dispatch::Canned(*reply) }
            }
            Some(Rule { intent, reply: None, .. }) => Route {
                intent: *intent,
                dispatch: Dispatch::Catalog {
                    price: self.parser.parse(message),
                    category: infer_category(message),
                    top_k: self.top_k,
                },
            },
            None => Route {
                intent: QueryIntent::GeneralOther,
                dispatch: Dispatch::Fallback { prompt: message.to_string() },
            },
        };
        debug!(intent = %route.intent, "routed message");
        route
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> IntentRouter {
        IntentRouter::default()
    }

    #[test]
    fn canned_intents() {
        let r = router();
        assert_eq!(
            r.route("hello"),
            Route { intent: QueryIntent::Greeting, dispatch: Dispatch::Canned(GREETING_REPLY) }
        );
        assert_eq!(r.route("Bye").intent, QueryIntent::Farewell);
        assert_eq!(r.route("thank you so much").dispatch, Dispatch::Canned(THANKS_REPLY));
        assert_eq!(r.route("can you help me").intent, QueryIntent::HelpRequest);
        assert_eq!(r.route("Who are you?").intent, QueryIntent::IdentityQuestion);
    }

    #[test]
    fn greeting_needs_a_short_message() {
        let r = router();
        assert_eq!(r.classify("hey there"), QueryIntent::Greeting);
        // too long for a greeting; "laptop" makes it a product query
        assert_eq!(r.classify("hello, show me a laptop"), QueryIntent::ProductQuery);
    }

    #[test]
    fn rule_order_wins() {
        // farewell is checked before thanks
        assert_eq!(router().classify("thanks, goodbye and see you"), QueryIntent::Farewell);
    }

    #[test]
    fn product_query_carries_price_and_category() {
        let route = router().route("Gaming laptop under 50000");
        assert_eq!(route.intent, QueryIntent::ProductQuery);
        assert_eq!(
            route.dispatch,
            Dispatch::Catalog { price: PriceConstraint::new(None, Some(50_000.0)), category: Some("laptop"), top_k: 3 }
        );
    }

    #[test]
    fn anything_else_goes_to_fallback() {
        let route = router().route("What is the capital of France");
        assert_eq!(route.intent, QueryIntent::GeneralOther);
        assert_eq!(route.dispatch, Dispatch::Fallback { prompt: "What is the capital of France".into() });
    }

    #[test]
    fn no_match_prompt_quotes_message() {
        assert_eq!(
            no_match_prompt("vr headset"),
            "I could not find matching products in the store for the following query: 'vr headset'. \
             Please provide general guidance based on product knowledge: vr headset"
        );
    }
}

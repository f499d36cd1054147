//! Argument filter tables.
//!
//! A policy is an ordered list of [`ArgRule`]s. The first rule matching a
//! token removes it; rules with `consumes_next` also remove the token that
//! follows (the flag's separate value). Unmatched tokens pass through.

/// How a rule recognises a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgPattern {
    /// The whole token equals the string.
    Exact(&'static str),
    /// The token starts with the string.
    Prefix(&'static str),
    /// The string followed by one or more ASCII digits, e.g. `--c99`.
    PrefixDigits(&'static str),
}

impl ArgPattern {
    /// Returns `true` if `arg` matches.
    #[must_use]
    pub fn matches(self, arg: &str) -> bool {
        match self {
            Self::Exact(s) => arg == s,
            Self::Prefix(s) => arg.starts_with(s),
            Self::PrefixDigits(s) => arg.strip_prefix(s).is_some_and(|rest| {
                !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit())
            }),
        }
    }
}

/// One entry of a filter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgRule {
    /// Tokens this rule removes.
    pub pattern: ArgPattern,
    /// Whether the following token is removed as well.
    pub consumes_next: bool,
}

const fn strip(pattern: ArgPattern) -> ArgRule {
    ArgRule {
        pattern,
        consumes_next: false,
    }
}

const fn strip_with_value(pattern: ArgPattern) -> ArgRule {
    ArgRule {
        pattern,
        consumes_next: true,
    }
}

/// `armcc` options that clang-based consumers of the database reject.
pub const ARMCC_UNKNOWN_ARGS: &[ArgRule] = &[
    strip(ArgPattern::Exact("--gnu")),
    strip(ArgPattern::PrefixDigits("--c")),
    strip(ArgPattern::Exact("--cpp")),
    strip_with_value(ArgPattern::Exact("--cpu")),
    strip(ArgPattern::Prefix("--apcs=")),
    strip(ArgPattern::Exact("--split_sections")),
    strip_with_value(ArgPattern::Exact("--omf_browse")),
    strip_with_value(ArgPattern::Exact("--depend")),
    strip(ArgPattern::Prefix("--diag_suppress=")),
    strip_with_value(ArgPattern::Exact("--diag_suppress")),
];

/// Output and dependency-emission options stripped before a macro query.
/// Include and define flags are kept since they can affect the result.
pub const MACRO_QUERY_ARGS: &[ArgRule] = &[
    strip_with_value(ArgPattern::Exact("-o")),
    strip_with_value(ArgPattern::Exact("--omf_browse")),
    strip_with_value(ArgPattern::Exact("--depend")),
    strip(ArgPattern::Exact("-MD")),
    strip(ArgPattern::Exact("-MMD")),
];

/// Applies a filter table to an argument list.
#[must_use]
pub fn filter_args(args: &[String], rules: &[ArgRule]) -> Vec<String> {
    let mut out = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match rules.iter().find(|r| r.pattern.matches(arg)) {
            None => out.push(arg.clone()),
            Some(rule) if rule.consumes_next => {
                iter.next();
            }
            Some(_) => {}
        }
    }
    out
}

//! Built-in texts used by the research pipeline
//!
//! Canned offline answers can be replaced from the settings file; these are
//! the defaults used when it names none.

/// Built-in texts that don't require files
pub mod builtin {
    /// Introduces the paper block appended to a question
    pub const PAPERS_PREAMBLE: &str =
        "Here are some relevant research papers that might help answer the question:";

    /// Maximum number of papers embedded in an augmented prompt
    pub const MAX_PROMPT_PAPERS: usize = 3;

    /// Abstracts longer than this many characters are cut in the prompt
    pub const ABSTRACT_PREVIEW_CHARS: usize = 200;

    /// Reply used while the backend is unreachable and no canned answer applies
    pub const OFFLINE_NOTICE: &str =
        "I'm currently offline. Your message will be processed when I'm back online.";

    pub const COVID_19: &str = r#"## COVID-19 Overview

COVID-19 is the disease caused by the SARS-CoV-2 coronavirus, first identified in late 2019.

**Key Findings**
- Spreads mainly through respiratory droplets and aerosols
- Common symptoms include fever, cough, fatigue and loss of taste or smell
- Vaccination substantially reduces the risk of severe illness and hospitalisation

I'm currently offline, so this answer comes from a stored summary rather than live research."#;

    pub const LONG_COVID: &str = r#"## Long COVID

Long COVID (post COVID-19 condition) describes symptoms that persist for at least three months after infection.

**Key Findings**
- Fatigue, breathlessness and cognitive difficulties ("brain fog") are most often reported
- It can follow mild as well as severe infections
- Proposed mechanisms include viral persistence, immune dysregulation and microvascular injury

I'm currently offline, so this answer comes from a stored summary rather than live research."#;

    pub const CRISPR: &str = r#"## CRISPR Gene Editing

CRISPR-Cas9 is a genome editing tool adapted from a bacterial immune system that cuts DNA at a location chosen by a guide RNA.

**Key Findings**
- Enables targeted gene knockouts, corrections and insertions
- The first CRISPR-based therapy was approved for sickle cell disease in 2023
- Off-target edits and delivery remain the main open challenges

I'm currently offline, so this answer comes from a stored summary rather than live research."#;

    pub const MRNA_VACCINES: &str = r#"## mRNA Vaccines

mRNA vaccines deliver messenger RNA in lipid nanoparticles so that cells briefly produce an antigen and train the immune system against it.

**Key Findings**
- Can be designed and manufactured quickly once a target sequence is known
- The mRNA is broken down within days and does not enter the cell nucleus
- Research is extending the platform to influenza, RSV and personalised cancer vaccines

I'm currently offline, so this answer comes from a stored summary rather than live research."#;

    /// Topic keywords paired with the canned answer they select, most specific first
    pub const CANNED_ANSWERS: &[(&[&str], &str)] = &[
        (&["long covid", "post covid", "post-covid"], LONG_COVID),
        (&["covid", "sars-cov-2", "coronavirus"], COVID_19),
        (&["crispr", "gene editing"], CRISPR),
        (&["mrna"], MRNA_VACCINES),
    ];
}

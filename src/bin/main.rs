use crossterm::style::Stylize;
use name_match::config;
use name_match::core::types::{NewRecord, SearchFilters, SearchResult};
use name_match::MatchEngine;
use std::io::{stdin, stdout, Write};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SHOWN_RESULTS: usize = 5;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "name_match=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let app_config = config::load_or_create(&config::config_path())?;
    let engine = MatchEngine::from_app_config(&app_config)?;

    println!("{}", "Name Match Console. Type 'exit' to quit.".bold());
    println!("---------------------------------------------------------------");
    print_help();

    let mut last_query = String::new();
    let mut last_results: Vec<SearchResult> = Vec::new();

    loop {
        print!("\n{} ", ">".cyan());
        stdout().flush()?;

        let mut input = String::new();
        if stdin().read_line(&mut input)? == 0 {
            break;
        }
        let cmd = input.trim();

        match cmd {
            "exit" => break,
            "" => continue,
            ":h" => print_help(),
            ":nomatch" => {
                if last_query.is_empty() {
                    println!("{}", "Nothing searched yet.".yellow());
                    continue;
                }
                match engine.record_no_match(&last_query, &SearchFilters::default()) {
                    Ok(()) => println!("Recorded '{}' as a no-match.", last_query),
                    Err(e) => println!("{} {}", "[ERROR]".red(), e),
                }
            }
            s if s.starts_with(":ok ") => {
                let picked = s[4..].trim().parse::<usize>().ok().filter(|n| *n > 0 && *n <= last_results.len());
                match picked {
                    Some(n) => {
                        let id = last_results[n - 1].record.id;
                        match engine.record_match(&last_query, id) {
                            Ok(()) => println!("Confirmed '{}' for '{}'.", last_results[n - 1].record.name, last_query),
                            Err(e) => println!("{} {}", "[ERROR]".red(), e),
                        }
                    }
                    None => println!("{}", "Pick a listed result, e.g. ':ok 1'.".yellow()),
                }
            }
            s if s.starts_with(":p ") => {
                let p = engine.process(&s[3..]);
                println!("  normalized: {}", p.normalized);
                println!("  roman:      {}", p.roman);
                println!("  devanagari: {}", p.devanagari);
                println!("  phonetic:   {}", p.phonetic);
            }
            s if s.starts_with(":s ") => {
                let suggestions = engine.suggest(&s[3..]);
                if suggestions.is_empty() {
                    println!("No suggestions found.");
                }
                for (i, name) in suggestions.iter().enumerate() {
                    println!("  {}: {}", i + 1, name);
                }
            }
            s if s.starts_with(":add ") => match parse_record(&s[5..]) {
                Some(new) => match engine.add_record(new) {
                    Ok(stored) => println!("Added record {} '{}'.", stored.id, stored.name),
                    Err(e) => println!("{} {}", "[ERROR]".red(), e),
                },
                None => println!("{}", "Usage: :add name|age|location|caseType|fir".yellow()),
            },
            s => match engine.search(s, &SearchFilters::default()) {
                Ok(results) => {
                    last_query = s.to_string();
                    print_results(&results);
                    last_results = results;
                }
                Err(e) => println!("{} {}", "[ERROR]".red(), e),
            },
        }
    }

    println!("\n{} records in corpus.", engine.len());
    Ok(())
}

/// `name|age|location|caseType|fir`; everything after the name is optional.
fn parse_record(line: &str) -> Option<NewRecord> {
    let mut parts = line.split('|').map(str::trim);
    let name = parts.next().filter(|n| !n.is_empty())?;
    let mut new = NewRecord::new(name);
    if let Some(age) = parts.next().and_then(|a| a.parse().ok()) {
        new = new.with_age(age);
    }
    new = new.with_location(parts.next().unwrap_or_default());
    new = new.with_case_type(parts.next().unwrap_or_default());
    Some(new.with_fir(parts.next().unwrap_or_default()))
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No matches. Use ':nomatch' to record it.");
        return;
    }
    println!("{} match(es):", results.len());
    for (i, r) in results.iter().take(SHOWN_RESULTS).enumerate() {
        let confidence = format!("{:>3}%", r.confidence);
        let confidence = if r.confidence >= 80 { confidence.green() } else { confidence.yellow() };
        println!(
            "  :{} {} {} ({}) age {} | {} | {} | {}",
            i + 1,
            confidence,
            r.record.name.as_str().bold(),
            r.record.processed.devanagari,
            r.record.age.map_or_else(|| "?".to_string(), |a| a.to_string()),
            r.record.location,
            r.record.case_type,
            r.record.fir,
        );
    }
}

fn print_help() {
    println!("Type a name to search, or:");
    println!("  :p <name>    show processed forms");
    println!("  :s <prefix>  suggestions");
    println!("  :add name|age|location|caseType|fir");
    println!("  :ok <n>      confirm result n of the last search");
    println!("  :nomatch     record the last search as a no-match");
}

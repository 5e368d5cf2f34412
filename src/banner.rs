//! Animated welcome screen shown when `pyflyby` is invoked with no arguments.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::thread;
use std::time::Duration;

// ── ASCII logo (PYFLYBY in box-drawing block font) ────────────────────────────

const LOGO: &[&str] = &[
    " ██████╗ ██╗   ██╗███████╗██╗  ██╗   ██╗██████╗ ██╗   ██╗",
    " ██╔══██╗╚██╗ ██╔╝██╔════╝██║  ╚██╗ ██╔╝██╔══██╗╚██╗ ██╔╝",
    " ██████╔╝ ╚████╔╝ █████╗  ██║   ╚████╔╝ ██████╔╝ ╚████╔╝ ",
    " ██╔═══╝   ╚██╔╝  ██╔══╝  ██║    ╚██╔╝  ██╔══██╗  ╚██╔╝  ",
    " ██║        ██║   ██║     ███████╗██║   ██████╔╝   ██║   ",
    " ╚═╝        ╚═╝   ╚═╝     ╚══════╝╚═╝   ╚═════╝    ╚═╝   ",
];

// ── Verb catalogue ─────────────────────────────────────────────────────────────

const VERBS: &[(&str, &str, &str)] = &[
    ("tidy", "add missing, drop unused", "pyflyby tidy foo.py"),
    ("reformat", "re-render prologue imports", "pyflyby reformat foo.py"),
    ("transform", "rewrite fullnames", "pyflyby transform --map old=new foo.py"),
    ("canonicalize", "apply the import database's preferred spellings", "pyflyby canonicalize foo.py"),
    ("replace-star", "expand `from X import *`", "pyflyby replace-star foo.py"),
    ("remove-broken", "drop imports that don't resolve", "pyflyby remove-broken foo.py"),
    ("collect", "run a verb over many files in parallel", "pyflyby collect tidy src/"),
];

// ── Helpers ───────────────────────────────────────────────────────────────────

#[inline]
fn sleep(ms: u64) {
    thread::sleep(Duration::from_millis(ms));
}

#[inline]
fn flush() {
    let _ = io::stdout().flush();
}

#[inline]
fn hide_cursor() {
    print!("\x1b[?25l");
    flush();
}

#[inline]
fn show_cursor() {
    print!("\x1b[?25h");
    flush();
}

/// Print without a trailing newline and flush immediately.
macro_rules! pf {
    ($($arg:tt)*) => {{
        print!($($arg)*);
        flush();
    }};
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Display the welcome screen.  Animates when stdout is a TTY; falls back to a
/// plain static print otherwise (e.g. piped output, CI, `--no-color` envs).
pub fn show_welcome() {
    if io::stdout().is_terminal() {
        // Restore cursor if we panic mid-animation.
        let _ = std::panic::catch_unwind(animated_welcome);
        show_cursor();
    } else {
        static_welcome();
    }
}

// ── Animated path (TTY) ───────────────────────────────────────────────────────

fn animated_welcome() {
    hide_cursor();

    // ── spinner intro ─────────────────────────────────────────────────────────
    let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
    for (i, frame) in frames.iter().enumerate() {
        pf!(
            "\r  {}  {}",
            frame.cyan().bold(),
            "Loading import database…".truecolor(120, 120, 120)
        );
        // First few frames slower for dramatic effect, then speed up.
        sleep(if i < 3 { 90 } else { 55 });
    }
    pf!("\r{}\r", " ".repeat(60));

    println!();

    // ── logo lines (revealed top-to-bottom) ───────────────────────────────────
    for (i, line) in LOGO.iter().enumerate() {
        // Gradient: brighter blue toward the middle rows.
        let coloured = match i {
            0 | 5 => line.truecolor(20, 60, 160).bold(),
            1 | 4 => line.truecolor(30, 90, 200).bold(),
            _ => line.truecolor(50, 120, 220).bold(),
        };
        println!("  {coloured}");
        sleep(35);
    }

    println!();

    // ── tagline (character-by-character typing effect) ────────────────────────
    let version = env!("CARGO_PKG_VERSION");
    let tagline = format!("🛫  Imports-to-imports rewriting for Python  —  v{version}");

    pf!("  ");
    for ch in tagline.chars() {
        pf!("{}", ch.to_string().white().bold());
        sleep(15);
    }
    println!();
    println!();

    // ── horizontal divider ────────────────────────────────────────────────────
    let rule = "─".repeat(70);
    println!("  {}", rule.truecolor(60, 60, 60));
    println!();
    sleep(60);

    // ── verbs ─────────────────────────────────────────────────────────────────
    println!("  {}", "Verbs".bold().underline());
    println!();

    for (verb, desc, _example) in VERBS {
        pf!(
            "    {} ",
            verb.to_string().on_truecolor(40, 40, 40).cyan().bold()
        );
        pf!("  {:<14}", "");
        pf!("  {}", desc.truecolor(90, 90, 90));
        println!();
        sleep(50);
    }

    println!();

    // ── divider ───────────────────────────────────────────────────────────────
    println!("  {}", rule.truecolor(60, 60, 60));
    println!();
    sleep(40);

    // ── usage ─────────────────────────────────────────────────────────────────
    println!("  {}", "Usage".bold().underline());
    println!();

    for (_verb, _desc, example) in VERBS {
        println!("    {}", example.green().bold());
        sleep(35);
    }
    println!(
        "    {}",
        "pyflyby tidy --json --write src/".green().bold()
    );

    println!();

    // ── closing divider ───────────────────────────────────────────────────────
    println!("  {}", rule.truecolor(60, 60, 60));
    println!();

    show_cursor();
}

// ── Static / non-TTY path ─────────────────────────────────────────────────────

fn static_welcome() {
    let version = env!("CARGO_PKG_VERSION");

    for line in LOGO {
        println!("  {line}");
    }

    println!();
    println!("  pyflyby v{version}  —  Imports-to-imports rewriting for Python");
    println!();
    println!("  Verbs:");
    for (verb, desc, _example) in VERBS {
        println!("    {verb:<14}{desc}");
    }
    println!();
    println!("  Usage:  pyflyby <VERB> [PATH …] [OPTIONS]");
    println!("          pyflyby tidy foo.py               add missing, drop unused");
    println!("          pyflyby collect tidy src/          run tidy over a tree, in parallel");
    println!("          pyflyby tidy --json -               read from stdin, emit JSON diagnostics");
    println!("          pyflyby --help                     full help text");
    println!();
}

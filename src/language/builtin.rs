// src/language/builtin.rs

//! The language table compiled into the crate.
//!
//! Entries are plain data; `[language.<id>]` sections in the config file can
//! override any of them or add new ones.

use std::time::Duration;

use super::template::{CommandTemplate, PathTemplate};
use super::{Language, PipelineSpec};

pub(crate) struct BuiltinLanguage {
    pub id: &'static str,
    pub display_name: &'static str,
    pub extension: &'static str,
    pub file_name: &'static str,
    pub aliases: &'static [&'static str],
    pub compile: Option<&'static [&'static str]>,
    pub artifact: Option<&'static str>,
    pub run: Option<&'static [&'static str]>,
}

pub(crate) const BUILTIN_LANGUAGES: &[BuiltinLanguage] = &[
    BuiltinLanguage {
        id: "python",
        display_name: "Python",
        extension: "py",
        file_name: "main.py",
        aliases: &["py", "python3"],
        compile: None,
        artifact: None,
        run: Some(&["python3", "-u", "{source}"]),
    },
    BuiltinLanguage {
        id: "javascript",
        display_name: "JavaScript",
        extension: "js",
        file_name: "main.js",
        aliases: &["js", "node"],
        compile: None,
        artifact: None,
        run: Some(&["node", "{source}"]),
    },
    BuiltinLanguage {
        id: "shell",
        display_name: "Shell",
        extension: "sh",
        file_name: "main.sh",
        aliases: &["sh", "bash"],
        compile: None,
        artifact: None,
        run: Some(&["sh", "{source}"]),
    },
    BuiltinLanguage {
        id: "go",
        display_name: "Go",
        extension: "go",
        file_name: "main.go",
        aliases: &["golang"],
        compile: None,
        artifact: None,
        run: Some(&["go", "run", "{source}"]),
    },
    BuiltinLanguage {
        id: "java",
        display_name: "Java",
        extension: "java",
        file_name: "Main.java",
        aliases: &[],
        compile: Some(&["javac", "-d", "{dir}", "{source}"]),
        artifact: Some("{dir}/{stem}.class"),
        run: Some(&["java", "-cp", "{dir}", "{stem}"]),
    },
    BuiltinLanguage {
        id: "kotlin",
        display_name: "Kotlin",
        extension: "kt",
        file_name: "Main.kt",
        aliases: &["kt"],
        compile: Some(&["kotlinc", "{source}", "-include-runtime", "-d", "{artifact}"]),
        artifact: Some("{dir}/{stem}.jar"),
        run: Some(&["java", "-jar", "{artifact}"]),
    },
    BuiltinLanguage {
        id: "c",
        display_name: "C",
        extension: "c",
        file_name: "main.c",
        aliases: &[],
        compile: Some(&["gcc", "{source}", "-o", "{artifact}"]),
        artifact: Some("{dir}/{stem}{exe}"),
        run: Some(&["{artifact}"]),
    },
    BuiltinLanguage {
        id: "cpp",
        display_name: "C++",
        extension: "cpp",
        file_name: "main.cpp",
        aliases: &["c++", "cxx", "cc"],
        compile: Some(&["g++", "-std=c++17", "{source}", "-o", "{artifact}"]),
        artifact: Some("{dir}/{stem}{exe}"),
        run: Some(&["{artifact}"]),
    },
    BuiltinLanguage {
        id: "rust",
        display_name: "Rust",
        extension: "rs",
        file_name: "main.rs",
        aliases: &["rs"],
        compile: Some(&["rustc", "--edition", "2021", "-o", "{artifact}", "{source}"]),
        artifact: Some("{dir}/{stem}{exe}"),
        run: Some(&["{artifact}"]),
    },
    BuiltinLanguage {
        id: "ruby",
        display_name: "Ruby",
        extension: "rb",
        file_name: "main.rb",
        aliases: &["rb"],
        compile: None,
        artifact: None,
        run: None,
    },
    BuiltinLanguage {
        id: "typescript",
        display_name: "TypeScript",
        extension: "ts",
        file_name: "main.ts",
        aliases: &["ts"],
        compile: None,
        artifact: None,
        run: None,
    },
    BuiltinLanguage {
        id: "html",
        display_name: "HTML",
        extension: "html",
        file_name: "index.html",
        aliases: &["htm"],
        compile: None,
        artifact: None,
        run: None,
    },
    BuiltinLanguage {
        id: "css",
        display_name: "CSS",
        extension: "css",
        file_name: "style.css",
        aliases: &[],
        compile: None,
        artifact: None,
        run: None,
    },
    BuiltinLanguage {
        id: "markdown",
        display_name: "Markdown",
        extension: "md",
        file_name: "README.md",
        aliases: &["md"],
        compile: None,
        artifact: None,
        run: None,
    },
    BuiltinLanguage {
        id: "json",
        display_name: "JSON",
        extension: "json",
        file_name: "data.json",
        aliases: &[],
        compile: None,
        artifact: None,
        run: None,
    },
];

impl BuiltinLanguage {
    pub(crate) fn to_language(&self, compile_timeout: Duration) -> Language {
        let pipeline = match (self.compile, self.artifact, self.run) {
            (Some(compile), Some(artifact), Some(run)) => PipelineSpec::CompileThenRun {
                compile: CommandTemplate::from_static(compile),
                artifact: PathTemplate::from_static(artifact),
                run: CommandTemplate::from_static(run),
                compile_timeout,
            },
            (None, None, Some(run)) => PipelineSpec::RunOnly {
                run: CommandTemplate::from_static(run),
            },
            _ => PipelineSpec::Unsupported,
        };

        Language {
            id: self.id.to_string(),
            display_name: self.display_name.to_string(),
            extension: self.extension.to_string(),
            file_name: self.file_name.to_string(),
            aliases: self.aliases.iter().map(|a| a.to_string()).collect(),
            pipeline,
            run_timeout: None,
        }
    }
}

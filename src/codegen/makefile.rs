/// Build-description emission.
///
/// The Unix flavor is a plain gcc makefile splitting user sources from the
/// runtime support sources. The C6x flavor drives TI's `cl6x` and links
/// through a generated linker-command file, with the runtime prebuilt as a
/// library.

use std::path::Path;

use super::names::NamingContext;
use super::TargetPlatform;

pub struct MakefileGenerator<'a> {
    names: &'a NamingContext,
    target: TargetPlatform,
    runtime_dir: &'a Path,
}

impl<'a> MakefileGenerator<'a> {
    pub fn new(names: &'a NamingContext, target: TargetPlatform, runtime_dir: &'a Path) -> Self {
        MakefileGenerator {
            names,
            target,
            runtime_dir,
        }
    }

    pub fn file_name(&self) -> &'static str {
        "makefile"
    }

    /// Generated `.c` files, classes sorted and the entry driver last.
    fn user_sources(&self, entry_class: &str, classes: &[String]) -> Vec<String> {
        let mut sources: Vec<String> = classes.iter().map(|c| self.names.code_file(c)).collect();
        sources.sort();
        sources.push(self.names.main_file(entry_class));
        sources
    }

    fn source_list(sources: &[String]) -> String {
        let mut out = String::from("USER_SOURCES = \\\n");
        for (i, source) in sources.iter().enumerate() {
            let cont = if i + 1 < sources.len() { " \\" } else { "" };
            out.push_str(&format!("\t{source}{cont}\n"));
        }
        out
    }

    pub fn makefile(&self, entry_class: &str, classes: &[String]) -> String {
        match self.target {
            TargetPlatform::Unix => self.unix(entry_class, classes),
            TargetPlatform::C6x => self.c6x(entry_class, classes),
        }
    }

    fn unix(&self, entry_class: &str, classes: &[String]) -> String {
        let exe = self.names.file_base(entry_class);
        let mut out = format!("# Build rules for {entry_class}. Generated by class2c; do not edit.\n\n");
        out.push_str(&format!("RUNTIME_DIR = {}\n\n", self.runtime_dir.display()));
        out.push_str("CC = gcc\n");
        out.push_str("CFLAGS = -Wall -g -I$(RUNTIME_DIR)\n");
        out.push_str("LIBS = -lm\n\n");
        out.push_str(&Self::source_list(&self.user_sources(entry_class, classes)));
        out.push_str("\nRUNTIME_SOURCES = $(wildcard $(RUNTIME_DIR)/*.c)\n\n");
        out.push_str("USER_OBJECTS = $(USER_SOURCES:.c=.o)\n");
        out.push_str("RUNTIME_OBJECTS = $(RUNTIME_SOURCES:.c=.o)\n\n");
        out.push_str(&format!("{exe}: $(USER_OBJECTS) $(RUNTIME_OBJECTS)\n"));
        out.push_str("\t$(CC) -o $@ $(USER_OBJECTS) $(RUNTIME_OBJECTS) $(LIBS)\n\n");
        out.push_str("%.o: %.c\n");
        out.push_str("\t$(CC) $(CFLAGS) -c $< -o $@\n\n");
        out.push_str("clean:\n");
        out.push_str(&format!(
            "\trm -f $(USER_OBJECTS) $(RUNTIME_OBJECTS) {exe}\n\n"
        ));
        out.push_str(".PHONY: clean\n");
        out
    }

    fn c6x(&self, entry_class: &str, classes: &[String]) -> String {
        let base = self.names.file_base(entry_class);
        let mut out = format!(
            "# Build rules for {entry_class} (TI C6000). Generated by class2c; do not edit.\n\n"
        );
        out.push_str(&format!("RUNTIME_DIR = {}\n\n", self.runtime_dir.display()));
        out.push_str("CC = cl6x\n");
        out.push_str("CFLAGS = -q -mv6700 -o2 -i$(RUNTIME_DIR)\n\n");
        out.push_str(&Self::source_list(&self.user_sources(entry_class, classes)));
        out.push_str("\nUSER_OBJECTS = $(USER_SOURCES:.c=.obj)\n\n");
        out.push_str(&format!("{base}.out: $(USER_OBJECTS) {base}.cmd\n"));
        out.push_str(&format!("\t$(CC) -z {base}.cmd\n\n"));
        out.push_str("%.obj: %.c\n");
        out.push_str("\t$(CC) $(CFLAGS) -c $<\n\n");
        out.push_str("clean:\n");
        out.push_str(&format!("\trm -f $(USER_OBJECTS) {base}.out\n\n"));
        out.push_str(".PHONY: clean\n");
        out
    }

    /// The linker-command file, by name and content. Only the C6x linker
    /// uses one.
    pub fn linker_command(&self, entry_class: &str, classes: &[String]) -> Option<(String, String)> {
        if self.target != TargetPlatform::C6x {
            return None;
        }
        let base = self.names.file_base(entry_class);
        let mut text = format!(
            "/* Linker directives for {entry_class}. Generated by class2c; do not edit. */\n\n"
        );
        text.push_str("-c\n");
        text.push_str("-heap  0x8000\n");
        text.push_str("-stack 0x4000\n");
        text.push_str(&format!("-o {base}.out\n\n"));
        for source in self.user_sources(entry_class, classes) {
            let object = source.trim_end_matches(".c").to_string();
            text.push_str(&format!("{object}.obj\n"));
        }
        text.push_str(&format!(
            "\n-l {}/runtime.lib\n",
            self.runtime_dir.display()
        ));
        Some((format!("{base}.cmd"), text))
    }
}

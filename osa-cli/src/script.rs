//! Line-oriented command interpreter over an [`Os`].

use std::io::{self, Read, Write};

use osa_core::fs::{join, SEPARATOR};
use osa_core::{ExitRequest, FileInfo, OsaError, Os};
use thiserror::Error;
use tracing::debug;

const DIR_PERM: u32 = 0o755;
const FILE_PERM: u32 = 0o644;

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Os(#[from] OsaError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn usage(text: &str) -> CommandError {
    CommandError::Usage(format!("usage: {}", text))
}

/// What to do after a line has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit(ExitRequest),
}

/// Runs script lines against an OS implementation.
pub struct Interpreter<'a> {
    os: &'a mut dyn Os,
    json: bool,
}

impl<'a> Interpreter<'a> {
    pub fn new(os: &'a mut dyn Os, json: bool) -> Self {
        Self { os, json }
    }

    /// Run lines until one fails or asks to exit.
    ///
    /// Failures are reported on the OS's stderr and turn into exit code 1.
    pub fn run<I, S>(&mut self, lines: I) -> ExitRequest
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for (number, line) in lines.into_iter().enumerate() {
            match self.run_line(line.as_ref()) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit(request)) => return request,
                Err(err) => {
                    let _ = writeln!(self.os.stderr(), "osa: line {}: {}", number + 1, err);
                    return ExitRequest::new(1);
                }
            }
        }
        ExitRequest::success()
    }

    pub fn run_line(&mut self, line: &str) -> Result<Flow, CommandError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(Flow::Continue);
        }
        let words = shell_words::split(line)
            .map_err(|e| CommandError::Usage(format!("cannot parse {:?}: {}", line, e)))?;
        let Some((command, args)) = words.split_first() else {
            return Ok(Flow::Continue);
        };
        debug!(command = command.as_str(), ?args, "run");

        match command.as_str() {
            "mkdir" => self.mkdir(args)?,
            "mktemp" => self.mktemp(args)?,
            "ls" => self.ls(args)?,
            "stat" => self.stat(args)?,
            "write" => self.write(args)?,
            "cat" => self.cat(args)?,
            "mv" => self.mv(args)?,
            "rm" => self.rm(args)?,
            "pwd" => self.print(&self.os.getwd()?)?,
            "home" => self.print(&self.os.user_home_dir()?)?,
            "cache" => self.print(&self.os.user_cache_dir()?)?,
            "config" => self.print(&self.os.user_config_dir()?)?,
            "echo" => self.print(&args.join(" "))?,
            "exit" => return self.exit(args),
            other => return Err(CommandError::Usage(format!("unknown command: {}", other))),
        }
        Ok(Flow::Continue)
    }

    /// Resolve a script path against the working directory.
    fn resolve(&self, path: &str) -> Result<String, CommandError> {
        if path.starts_with(SEPARATOR) || path.starts_with(self.os.path_separator()) {
            return Ok(path.to_string());
        }
        Ok(join(&self.os.getwd()?, path))
    }

    fn print(&self, text: &str) -> Result<(), CommandError> {
        let mut out = self.os.stdout();
        if self.json {
            writeln!(out, "{}", serde_json::to_string(text)?)?;
        } else {
            writeln!(out, "{}", text)?;
        }
        Ok(())
    }

    fn print_info(&self, info: &FileInfo) -> Result<(), CommandError> {
        let mut out = self.os.stdout();
        if self.json {
            writeln!(out, "{}", serde_json::to_string(info)?)?;
        } else {
            let kind = if info.is_dir { 'd' } else { '-' };
            writeln!(out, "{} {:>8} {}", kind, info.size, info.name)?;
        }
        Ok(())
    }

    fn mkdir(&mut self, args: &[String]) -> Result<(), CommandError> {
        let (parents, paths) = match args.split_first() {
            Some((flag, rest)) if flag == "-p" => (true, rest),
            _ => (false, args),
        };
        if paths.is_empty() {
            return Err(usage("mkdir [-p] PATH..."));
        }
        for path in paths {
            let path = self.resolve(path)?;
            if parents {
                self.os.mkdir_all(&path, DIR_PERM)?;
            } else {
                self.os.mkdir(&path, DIR_PERM)?;
            }
        }
        Ok(())
    }

    fn mktemp(&mut self, args: &[String]) -> Result<(), CommandError> {
        let (dir, pattern) = match args {
            [pattern] => (String::new(), pattern),
            [dir, pattern] => (self.resolve(dir)?, pattern),
            _ => return Err(usage("mktemp [DIR] PATTERN")),
        };
        let created = self.os.mkdir_temp(&dir, pattern)?;
        self.print(&created)
    }

    fn ls(&mut self, args: &[String]) -> Result<(), CommandError> {
        let path = match args {
            [] => self.os.getwd()?,
            [path] => self.resolve(path)?,
            _ => return Err(usage("ls [PATH]")),
        };
        let entries = self.os.read_dir(&path)?;
        if self.json {
            writeln!(self.os.stdout(), "{}", serde_json::to_string(&entries)?)?;
            return Ok(());
        }
        for entry in &entries {
            self.print_info(entry)?;
        }
        Ok(())
    }

    fn stat(&mut self, args: &[String]) -> Result<(), CommandError> {
        if args.is_empty() {
            return Err(usage("stat PATH..."));
        }
        for path in args {
            let info = self.os.stat(&self.resolve(path)?)?;
            self.print_info(&info)?;
        }
        Ok(())
    }

    /// `write PATH TEXT...` writes the text; without text, stdin is copied.
    fn write(&mut self, args: &[String]) -> Result<(), CommandError> {
        let Some((path, text)) = args.split_first() else {
            return Err(usage("write PATH [TEXT...]"));
        };
        let path = self.resolve(path)?;
        let data = if text.is_empty() {
            let mut data = Vec::new();
            self.os.stdin().read_to_end(&mut data)?;
            data
        } else {
            format!("{}\n", text.join(" ")).into_bytes()
        };
        self.os.write_file(&path, &data, FILE_PERM)?;
        Ok(())
    }

    fn cat(&mut self, args: &[String]) -> Result<(), CommandError> {
        if args.is_empty() {
            return Err(usage("cat PATH..."));
        }
        let mut out = self.os.stdout();
        for path in args {
            let mut handle = self.os.open(&self.resolve(path)?)?;
            io::copy(&mut handle, &mut out)?;
            handle.close()?;
        }
        out.flush()?;
        Ok(())
    }

    fn mv(&mut self, args: &[String]) -> Result<(), CommandError> {
        let [old, new] = args else {
            return Err(usage("mv OLD NEW"));
        };
        let (old, new) = (self.resolve(old)?, self.resolve(new)?);
        self.os.rename(&old, &new)?;
        Ok(())
    }

    fn rm(&mut self, args: &[String]) -> Result<(), CommandError> {
        let (recursive, paths) = match args.split_first() {
            Some((flag, rest)) if flag == "-r" => (true, rest),
            _ => (false, args),
        };
        if paths.is_empty() {
            return Err(usage("rm [-r] PATH..."));
        }
        for path in paths {
            let path = self.resolve(path)?;
            if recursive {
                self.os.remove_all(&path)?;
            } else {
                self.os.remove(&path)?;
            }
        }
        Ok(())
    }

    fn exit(&self, args: &[String]) -> Result<Flow, CommandError> {
        let code = match args {
            [] => 0,
            [code] => code
                .parse()
                .map_err(|_| CommandError::Usage(format!("bad exit code: {}", code)))?,
            _ => return Err(usage("exit [CODE]")),
        };
        Ok(Flow::Exit(ExitRequest::new(code)))
    }
}

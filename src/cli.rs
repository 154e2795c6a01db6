use clap::Parser;

/// CLI switches for rotating, pinning and filtering wallpapers.
#[derive(Parser, Debug)]
#[command(
    name = "wpc",
    about = "Wallpaper changer thingus",
    after_help = "Exit status: 0 ok, 1 locked, 2 usage error, 3 setter failed, \
                  4 setup or filesystem error, 5 no matching or previous wallpaper"
)]
pub struct Args {
    /// Show the wallpaper category, or set it when a name is given.
    #[arg(short = 'c', long = "category", value_name = "NAME", num_args = 0..=1)]
    pub category: Option<Option<String>>,

    /// Show the wallpaper resolution, or set it when a value is given.
    #[arg(short = 'r', long = "resolution", value_name = "RES", num_args = 0..=1)]
    pub resolution: Option<Option<String>>,

    #[arg(short = 'd', long = "dump-cache", help = "Display wallpaper cache")]
    pub dump_cache: bool,

    #[arg(short = 'f', long = "flush-cache", help = "Flush the wallpaper cache")]
    pub flush_cache: bool,

    #[arg(short = 'l', long = "lock", help = "Lock the current wallpaper")]
    pub lock: bool,

    #[arg(short = 'u', long = "unlock", help = "Unlock the current wallpaper")]
    pub unlock: bool,

    #[arg(
        short = 'C',
        long = "clear",
        help = "Clear previous category and resolution"
    )]
    pub clear: bool,

    #[arg(
        short = 'p',
        long = "previous",
        help = "Set wallpaper to the previous wallpaper"
    )]
    pub previous: bool,
}

/// The single operation a run performs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Lock,
    Unlock,
    Clear,
    Category(Option<String>),
    Resolution(Option<String>),
    DumpCache,
    FlushCache,
    Previous,
    Rotate,
}

impl Args {
    /// Resolve the flags into one action; the first set flag wins.
    pub fn action(&self) -> Action {
        if self.lock {
            Action::Lock
        } else if self.unlock {
            Action::Unlock
        } else if self.clear {
            Action::Clear
        } else if let Some(value) = &self.category {
            Action::Category(value.clone())
        } else if let Some(value) = &self.resolution {
            Action::Resolution(value.clone())
        } else if self.dump_cache {
            Action::DumpCache
        } else if self.flush_cache {
            Action::FlushCache
        } else if self.previous {
            Action::Previous
        } else {
            Action::Rotate
        }
    }
}

use std::{fmt, time::Duration};

use clap::builder::PossibleValue;

/// Width of the front panel display in characters.
pub const DISPLAY_WIDTH: usize = 12;

/// HP 5384A program codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Identify,
    Reset,
    Filter(bool),
    Attenuator(bool),
    ManualLevel(bool),
    Gate(GateTime),
    Function(Function),
    Digit(DigitMode),
    DisplayNormal,
    DisplayText(String),
}

impl Command {
    /// The counter has no display-off code, so the display is overwritten with spaces.
    pub fn blank_display() -> Self {
        Self::DisplayText(" ".repeat(DISPLAY_WIDTH))
    }
}

fn switch(f: &mut fmt::Formatter<'_>, code: &str, on: bool) -> fmt::Result {
    write!(f, "{}{}", code, if on { 1 } else { 0 })
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Identify => f.write_str("ID"),
            Command::Reset => f.write_str("IN"),
            Command::Filter(on) => switch(f, "FI", *on),
            Command::Attenuator(on) => switch(f, "AT", *on),
            Command::ManualLevel(on) => switch(f, "ML", *on),
            Command::Gate(gate) => match gate {
                GateTime::T0S1 => f.write_str("GA1"),
                GateTime::T1S => f.write_str("GA2"),
                GateTime::T10S => f.write_str("GA3"),
            },
            Command::Function(function) => match function {
                Function::FrequencyA => f.write_str("FU1"),
                Function::PeriodA => f.write_str("FU2"),
                Function::FrequencyB => f.write_str("FU3"),
            },
            Command::Digit(mode) => match mode {
                DigitMode::Increment => f.write_str("DI"),
                DigitMode::Decrement => f.write_str("DD"),
                DigitMode::Normal => f.write_str("DN"),
            },
            Command::DisplayNormal => f.write_str("DL"),
            Command::DisplayText(text) => write!(f, "DR{}", text),
        }
    }
}

/// Counter gate time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTime {
    T0S1,
    T1S,
    T10S,
}

impl GateTime {
    pub fn duration(self) -> Duration {
        match self {
            GateTime::T0S1 => Duration::from_millis(100),
            GateTime::T1S => Duration::from_secs(1),
            GateTime::T10S => Duration::from_secs(10),
        }
    }

    /// Read timeout a measurement with this gate needs.
    pub fn read_timeout(self) -> Duration {
        match self {
            GateTime::T0S1 | GateTime::T1S => Duration::from_millis(1200),
            GateTime::T10S => Duration::from_millis(15000),
        }
    }
}

impl fmt::Display for GateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateTime::T0S1 => f.write_str("0.1 s"),
            GateTime::T1S => f.write_str("1 s"),
            GateTime::T10S => f.write_str("10 s"),
        }
    }
}

impl clap::ValueEnum for GateTime {
    fn value_variants<'a>() -> &'a [Self] {
        &[GateTime::T0S1, GateTime::T1S, GateTime::T10S]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(match self {
            GateTime::T0S1 => PossibleValue::new("0.1").alias("100ms"),
            GateTime::T1S => PossibleValue::new("1").alias("1s"),
            GateTime::T10S => PossibleValue::new("10").alias("10s"),
        })
    }
}

/// Measurement function and input channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    FrequencyA,
    PeriodA,
    FrequencyB,
}

impl Function {
    pub fn unit(self) -> &'static str {
        match self {
            Function::FrequencyA | Function::FrequencyB => "Hz",
            Function::PeriodA => "s",
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::FrequencyA => f.write_str("Frequency A"),
            Function::PeriodA => f.write_str("Period A"),
            Function::FrequencyB => f.write_str("Frequency B"),
        }
    }
}

impl clap::ValueEnum for Function {
    fn value_variants<'a>() -> &'a [Self] {
        &[Function::FrequencyA, Function::PeriodA, Function::FrequencyB]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(match self {
            Function::FrequencyA => PossibleValue::new("freq-a").help("Frequency, input A"),
            Function::PeriodA => PossibleValue::new("per-a").help("Period, input A"),
            Function::FrequencyB => PossibleValue::new("freq-b").help("Frequency, input B"),
        })
    }
}

/// Manual digit selection on the front panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitMode {
    Increment,
    Decrement,
    Normal,
}

impl clap::ValueEnum for DigitMode {
    fn value_variants<'a>() -> &'a [Self] {
        &[DigitMode::Increment, DigitMode::Decrement, DigitMode::Normal]
    }

    fn to_possible_value(&self) -> Option<PossibleValue> {
        Some(match self {
            DigitMode::Increment => PossibleValue::new("inc"),
            DigitMode::Decrement => PossibleValue::new("dec"),
            DigitMode::Normal => PossibleValue::new("normal"),
        })
    }
}

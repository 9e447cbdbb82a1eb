use core::fmt::Write;

use embassy_executor::task;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Receiver, Sender};
use heapless::String;

use trip_computer::config::{SCREEN_HEIGHT, SCREEN_WIDTH};
use trip_computer::view::{Color, Field, Renderer};

use crate::usb::{UsbSerial, MAX_PACKET};

pub const DISPLAY_QUEUE: usize = 32;

#[derive(Clone, Debug)]
pub enum DisplayCommand {
    Text { x: u16, y: u16, text: Field },
    Window { x: u16, y: u16, w: u16, h: u16 },
    Fill(Color),
}

/// Renderer that queues draw commands for the console task. A full queue
/// drops the command; the next cadence tick redraws the values anyway.
pub struct ConsoleRenderer {
    tx: Sender<'static, CriticalSectionRawMutex, DisplayCommand, DISPLAY_QUEUE>,
    dropped: u32,
}

impl ConsoleRenderer {
    pub fn new(tx: Sender<'static, CriticalSectionRawMutex, DisplayCommand, DISPLAY_QUEUE>) -> Self {
        Self { tx, dropped: 0 }
    }

    pub fn dropped(&self) -> u32 {
        self.dropped
    }

    fn push(&mut self, cmd: DisplayCommand) {
        if self.tx.try_send(cmd).is_err() {
            self.dropped = self.dropped.wrapping_add(1);
        }
    }
}

impl Renderer for ConsoleRenderer {
    fn write_string(&mut self, x: u16, y: u16, text: &str) {
        let mut field = Field::new();
        let _ = field.push_str(text);
        self.push(DisplayCommand::Text { x, y, text: field });
    }

    fn set_window(&mut self, x: u16, y: u16, w: u16, h: u16) {
        self.push(DisplayCommand::Window { x, y, w, h });
    }

    fn fill(&mut self, color: Color) {
        self.push(DisplayCommand::Fill(color));
    }
}

/// Drains the draw queue onto the USB console, one line per command that
/// changes what is on screen.
#[task]
pub async fn display_task(
    mut usb_serial: UsbSerial<'static>,
    rx: Receiver<'static, CriticalSectionRawMutex, DisplayCommand, DISPLAY_QUEUE>,
) {
    let mut window = (0u16, 0u16, SCREEN_WIDTH, SCREEN_HEIGHT);

    loop {
        let cmd = rx.receive().await;

        let mut line = String::<64>::new();
        match cmd {
            DisplayCommand::Window { x, y, w, h } => {
                window = (x, y, w, h);
                continue;
            }
            DisplayCommand::Fill(color) => {
                if window == (0, 0, SCREEN_WIDTH, SCREEN_HEIGHT) {
                    let _ = write!(line, "\x1b[2J[CLS {:04x}]\r\n", color.0);
                } else {
                    let _ = write!(
                        line,
                        "[FILL {},{} {}x{} {:04x}]\r\n",
                        window.0, window.1, window.2, window.3, color.0
                    );
                }
            }
            DisplayCommand::Text { x, y, text } => {
                let _ = write!(line, "[{:3},{:3}] {}\r\n", x, y, text.as_str());
            }
        }

        if !usb_serial.dtr() {
            continue;
        }
        for chunk in line.as_bytes().chunks(MAX_PACKET as usize) {
            if usb_serial.write_packet(chunk).await.is_err() {
                break;
            }
        }
    }
}

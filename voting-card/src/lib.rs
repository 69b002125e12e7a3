//! Virtual voting smart card
//!
//! A software card hosting a single voting applet. A reader proves it holds
//! the provisioned AES-128 key through a challenge-response handshake; the
//! card answers with its own proof and then releases and signs the stored
//! voter record.
//!
//! The card speaks raw ISO 7816-4 APDUs:
//!
//! ```ignore
//! use voting_card::{CardConfig, VirtualCard};
//!
//! let mut card = VirtualCard::new(CardConfig::default());
//! let atr = card.power_on();
//! let rsp = card.transmit(&[0x00, 0xA4, 0x04, 0x00, 0x06, 0xAE, 0x33, 0x93, 0xEE, 0x01, 0x02]);
//! assert_eq!(rsp, vec![0x90, 0x00]);
//! ```

pub mod apdu;
pub mod card;
pub mod crypto;
pub mod voting;

use log::{debug, info, warn};

use apdu::{ins, parse_apdu, Response, APDU, SW};
use voting::VotingApplet;

pub use card::{CardConfig, ConfigError};

/// Virtual card with one embedded voting applet
#[derive(Debug)]
pub struct VirtualCard {
    applet: VotingApplet,
    /// Whether the applet is the selected application
    selected: bool,
    atr: Vec<u8>,
    powered: bool,
}

impl VirtualCard {
    /// Create a card provisioned from `config`
    pub fn new(config: CardConfig) -> Self {
        Self {
            applet: VotingApplet::new(&config),
            selected: false,
            atr: card::create_voting_atr(),
            powered: false,
        }
    }

    /// Create a card from the file named by `VOTING_CARD_CONFIG`, or defaults
    pub fn from_env() -> Self {
        Self::new(CardConfig::from_env())
    }

    /// Power on the card
    pub fn power_on(&mut self) -> Vec<u8> {
        self.powered = true;
        self.deselect();
        info!("Virtual card powered on");
        self.atr.clone()
    }

    /// Power off the card
    pub fn power_off(&mut self) {
        self.powered = false;
        self.deselect();
        info!("Virtual card powered off");
    }

    /// Warm reset
    pub fn reset(&mut self) -> Vec<u8> {
        self.deselect();
        self.powered = true;
        info!("Virtual card reset");
        self.atr.clone()
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn atr(&self) -> &[u8] {
        &self.atr
    }

    pub fn applet(&self) -> &VotingApplet {
        &self.applet
    }

    /// Send a raw command APDU and get the raw response (data + SW1 SW2)
    pub fn transmit(&mut self, apdu_bytes: &[u8]) -> Vec<u8> {
        if !self.powered {
            return Response::error(SW::CONDITIONS_NOT_SATISFIED).to_bytes();
        }

        let cmd = match parse_apdu(apdu_bytes) {
            Ok(apdu) => apdu,
            Err(e) => {
                warn!("Failed to parse APDU: {}", e);
                return Response::error(SW::WRONG_LENGTH).to_bytes();
            }
        };

        debug!("Processing APDU: CLA={:02X} INS={:02X} P1={:02X} P2={:02X}",
               cmd.cla, cmd.ins, cmd.p1, cmd.p2);

        let response = if cmd.ins == ins::SELECT {
            if cmd.p1 == 0x04 {
                self.handle_select(&cmd)
            } else {
                // SELECT MF and file selection are not supported
                Response::error(SW::INS_NOT_SUPPORTED)
            }
        } else if self.selected {
            self.applet.process_apdu(&cmd)
        } else {
            Response::error(SW::CONDITIONS_NOT_SATISFIED)
        };

        response.to_bytes()
    }

    /// SELECT by DF name
    fn handle_select(&mut self, cmd: &APDU) -> Response {
        if cmd.data.as_slice() != self.applet.aid() {
            debug!("Unknown AID: {:02X?}", cmd.data);
            return Response::error(SW::FILE_NOT_FOUND);
        }

        self.selected = true;
        self.applet.select()
    }

    fn deselect(&mut self) {
        self.selected = false;
        self.applet.reset();
    }
}

impl Default for VirtualCard {
    fn default() -> Self {
        Self::new(CardConfig::default())
    }
}

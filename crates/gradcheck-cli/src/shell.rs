//! Operator commands read from standard input.

use std::str::FromStr;

use anyhow::{Result, anyhow, bail};
use gradcheck_coordinator::CoordinatorHandle;
use gradcheck_core::{BarcodeModel, CaptureMode, FaceModel, Identity, ModelSelection, StationId};
use gradcheck_services::mock::MockBackendHandle;

pub const HELP: &str = "\
commands:
  station <1|2|3> [face|code]     activate a station
  scan                            station 1: ask for the ticket code
  dismiss                         station 1: close the verification result
  next                            advance the serving queue
  refresh                         refresh the queue snapshot
  settings                        show the model selection
  settings <face> <barcode>       store a model selection
  show <1|2> <face|code> <id> <name...>   demo: put someone in front of a camera
  hide <1|2> <face|code>          demo: empty a camera
  view                            print the active station
  help
  quit";

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    Station(StationId, CaptureMode),
    Scan,
    Dismiss,
    Next,
    Refresh,
    LoadSettings,
    SaveSettings(ModelSelection),
    Show(StationId, CaptureMode, Identity),
    Hide(StationId, CaptureMode),
    View,
    Help,
    Quit,
}

impl FromStr for Operator {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self> {
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&verb, args)) = words.split_first() else {
            bail!("empty command");
        };

        let operator = match (verb.to_ascii_lowercase().as_str(), args) {
            ("station" | "s", [station]) => {
                let station: StationId = station.parse()?;
                Operator::Station(station, default_mode(station))
            }
            ("station" | "s", [station, mode]) => Operator::Station(station.parse()?, mode.parse()?),
            ("scan", []) => Operator::Scan,
            ("dismiss", []) => Operator::Dismiss,
            ("next", []) => Operator::Next,
            ("refresh", []) => Operator::Refresh,
            ("settings", []) => Operator::LoadSettings,
            ("settings", [face, barcode]) => Operator::SaveSettings(ModelSelection {
                face: FaceModel::from_str(face)?,
                barcode: BarcodeModel::from_str(barcode)?,
            }),
            ("show", [station, mode, id, name @ ..]) if !name.is_empty() => {
                Operator::Show(station.parse()?, mode.parse()?, Identity::new(*id, name.join(" ")))
            }
            ("hide", [station, mode]) => Operator::Hide(station.parse()?, mode.parse()?),
            ("view", []) => Operator::View,
            ("help" | "?", []) => Operator::Help,
            ("quit" | "exit" | "q", []) => Operator::Quit,
            _ => return Err(anyhow!("unrecognized command: {line}")),
        };
        Ok(operator)
    }
}

/// Mode a station starts in when none is given.
pub fn default_mode(station: StationId) -> CaptureMode {
    match station {
        StationId::Confirmation => CaptureMode::Code,
        _ => CaptureMode::Face,
    }
}

/// Run one command. Returns `false` once the operator quits.
pub async fn execute(
    operator: Operator,
    kiosk: &CoordinatorHandle,
    demo: Option<&MockBackendHandle>,
) -> Result<bool> {
    match operator {
        Operator::Station(station, mode) => kiosk.activate_station(station, mode).await?,
        Operator::Scan => kiosk.request_code_scan().await?,
        Operator::Dismiss => kiosk.dismiss_verification().await?,
        Operator::Next => {
            let outcome = kiosk.advance_queue().await?;
            println!("{}", outcome.message());
        }
        Operator::Refresh => kiosk.refresh_queue().await?,
        Operator::LoadSettings => {
            let selection = kiosk.load_settings().await?;
            println!("face: {:?}, barcode: {:?}", selection.face, selection.barcode);
        }
        Operator::SaveSettings(selection) => {
            kiosk.save_settings(selection).await?;
        }
        Operator::Show(station, mode, identity) => {
            demo_server(demo)?.set_reading(station, mode, identity);
        }
        Operator::Hide(station, mode) => demo_server(demo)?.clear_reading(station, mode),
        Operator::View => print!("{}", kiosk.view()),
        Operator::Help => println!("{HELP}"),
        Operator::Quit => return Ok(false),
    }
    Ok(true)
}

fn demo_server(demo: Option<&MockBackendHandle>) -> Result<&MockBackendHandle> {
    demo.ok_or_else(|| anyhow!("camera scripting needs --demo"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("station 2", Operator::Station(StationId::Confirmation, CaptureMode::Code))]
    #[case("s 1", Operator::Station(StationId::CheckIn, CaptureMode::Face))]
    #[case("station 1 code", Operator::Station(StationId::CheckIn, CaptureMode::Code))]
    #[case("  SCAN ", Operator::Scan)]
    #[case("next", Operator::Next)]
    #[case("settings", Operator::LoadSettings)]
    #[case("q", Operator::Quit)]
    fn test_parse(#[case] line: &str, #[case] expected: Operator) {
        assert_eq!(line.parse::<Operator>().unwrap(), expected);
    }

    #[test]
    fn test_parse_settings() {
        let operator: Operator = "settings mtcnn pyzbar".parse().unwrap();
        assert_eq!(
            operator,
            Operator::SaveSettings(ModelSelection {
                face: FaceModel::Mtcnn,
                barcode: BarcodeModel::Pyzbar,
            })
        );
    }

    #[test]
    fn test_parse_show_joins_name() {
        let operator: Operator = "show 1 face 2201 Ada Lovelace".parse().unwrap();
        assert_eq!(
            operator,
            Operator::Show(
                StationId::CheckIn,
                CaptureMode::Face,
                Identity::new("2201", "Ada Lovelace")
            )
        );
    }

    #[rstest]
    #[case("")]
    #[case("station 4")]
    #[case("station 1 video")]
    #[case("settings mtcnn")]
    #[case("show 1 face 2201")]
    #[case("fly")]
    fn test_parse_invalid(#[case] line: &str) {
        assert!(line.parse::<Operator>().is_err());
    }
}

use crate::classifier::{Classifier, ClassifyError, RiskVerdict};
use crate::sensor::SensorReading;
use crate::state::RiskLevel;
use serde::Serialize;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, SystemTime};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Fixed policy instruction sent to the engine with every request. The engine
/// applies these thresholds; this crate never re-checks them.
const RISK_POLICY: &str = "You assess lateral clearance risk for a transit bus. \
Given a sensor reading, respond with a JSON object containing exactly two fields: \
\"riskLevel\" (one of LOW, MEDIUM, HIGH) and \"explanation\" (one short sentence). \
Classify HIGH when either clearance is below 30 cm, closing speed exceeds 5 m/s, \
or vehicle speed exceeds 80 km/h in traffic mode. Classify MEDIUM for clearance \
between 30 and 80 cm, closing speed between 2 and 5 m/s, or high speed on the \
highway with adequate clearance. Classify LOW for clearance above 100 cm, closing \
speed below 2 m/s, and controlled speed appropriate to the driving mode.";

const FALLBACK_EXPLANATION: &str = "No explanation provided by the classification engine.";

/// Classification engine reached over HTTP. Only `http://` endpoints are
/// supported; the engine is expected to sit on the local network.
#[derive(Debug, Clone)]
pub struct LlmClassifier {
    endpoint: String,
    model_id: String,
    vehicle_id: String,
    timeout: Duration,
}

impl LlmClassifier {
    pub fn new(endpoint: String, model_id: String, vehicle_id: String, timeout: Duration) -> Self {
        Self {
            endpoint,
            model_id,
            vehicle_id,
            timeout,
        }
    }

    fn post(&self, body: &str) -> Result<String, ClassifyError> {
        let target = EndpointParts::parse(&self.endpoint)?;
        let mut stream = target.connect(self.timeout)?;

        write!(
            stream,
            "POST {} HTTP/1.1\r\nHost: {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            target.path,
            target.host,
            body.len(),
            body
        )
        .map_err(ClassifyError::Io)?;

        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .map_err(ClassifyError::Io)?;

        let (status, body) = split_http_response(&response)?;
        if status >= 400 {
            return Err(ClassifyError::Http(status, body.trim().to_string()));
        }
        Ok(body.to_string())
    }
}

impl Classifier for LlmClassifier {
    fn classify(&self, reading: &SensorReading) -> Result<RiskVerdict, ClassifyError> {
        let request = ClassifyRequest::new(
            &self.model_id,
            &self.vehicle_id,
            reading,
            SystemTime::now(),
        )?;
        let payload = serde_json::to_string(&request).map_err(ClassifyError::Json)?;
        let body = self.post(&payload)?;
        parse_verdict(&body)
    }
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    model: &'a str,
    system: &'static str,
    input: ReadingPayload<'a>,
}

impl<'a> ClassifyRequest<'a> {
    fn new(
        model: &'a str,
        vehicle_id: &'a str,
        reading: &SensorReading,
        timestamp: SystemTime,
    ) -> Result<Self, ClassifyError> {
        Ok(Self {
            model,
            system: RISK_POLICY,
            input: ReadingPayload {
                vehicle_id,
                left_clearance: reading.left_clearance_cm,
                right_clearance: reading.right_clearance_cm,
                closing_speed: reading.closing_speed_mps,
                vehicle_speed: reading.vehicle_speed_kmh,
                driving_mode: reading.driving_mode.label(),
                timestamp: format_timestamp(timestamp)?,
            },
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReadingPayload<'a> {
    vehicle_id: &'a str,
    left_clearance: f64,
    right_clearance: f64,
    closing_speed: f64,
    vehicle_speed: f64,
    driving_mode: &'static str,
    timestamp: String,
}

/// Lenient by policy: a `riskLevel` or `explanation` that is missing,
/// wrong-typed, or unrecognised falls back to a LOW verdict rather than an
/// error. Only a body that is not a JSON object at all counts as a transport
/// failure.
fn parse_verdict(body: &str) -> Result<RiskVerdict, ClassifyError> {
    let payload: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(body).map_err(ClassifyError::Json)?;

    let risk_level = payload
        .get("riskLevel")
        .and_then(serde_json::Value::as_str)
        .and_then(parse_risk_level)
        .unwrap_or(RiskLevel::Low);
    let explanation = payload
        .get("explanation")
        .and_then(serde_json::Value::as_str)
        .filter(|text| !text.trim().is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| FALLBACK_EXPLANATION.to_string());

    Ok(RiskVerdict {
        risk_level,
        explanation,
    })
}

fn parse_risk_level(label: &str) -> Option<RiskLevel> {
    match label.trim().to_ascii_uppercase().as_str() {
        "LOW" => Some(RiskLevel::Low),
        "MEDIUM" => Some(RiskLevel::Medium),
        "HIGH" => Some(RiskLevel::High),
        _ => None,
    }
}

fn format_timestamp(timestamp: SystemTime) -> Result<String, ClassifyError> {
    let datetime = OffsetDateTime::from(timestamp);
    datetime.format(&Rfc3339).map_err(ClassifyError::Timestamp)
}

struct EndpointParts {
    host: String,
    port: u16,
    path: String,
}

impl EndpointParts {
    fn parse(endpoint: &str) -> Result<Self, ClassifyError> {
        let rest = endpoint
            .strip_prefix("http://")
            .ok_or_else(|| ClassifyError::InvalidEndpoint("only http:// supported".to_string()))?;

        let (authority, path) = rest
            .split_once('/')
            .map(|(authority, path)| (authority, format!("/{path}")))
            .unwrap_or((rest, String::from("/")));

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => (
                host,
                port.parse::<u16>().map_err(|_| {
                    ClassifyError::InvalidEndpoint(format!("invalid port: {port}"))
                })?,
            ),
            None => (authority, 80),
        };
        if host.is_empty() {
            return Err(ClassifyError::InvalidEndpoint("missing host".to_string()));
        }

        Ok(Self {
            host: host.to_string(),
            port,
            path,
        })
    }

    fn connect(&self, timeout: Duration) -> Result<TcpStream, ClassifyError> {
        let addr = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|err| ClassifyError::Dns(err.to_string()))?
            .next()
            .ok_or_else(|| ClassifyError::Dns("no addresses resolved".to_string()))?;

        let stream =
            TcpStream::connect_timeout(&addr, timeout).map_err(ClassifyError::Connect)?;
        stream
            .set_read_timeout(Some(timeout))
            .map_err(ClassifyError::Io)?;
        stream
            .set_write_timeout(Some(timeout))
            .map_err(ClassifyError::Io)?;
        Ok(stream)
    }
}

/// Split a raw HTTP/1.1 response into status code and body.
fn split_http_response(response: &str) -> Result<(u16, &str), ClassifyError> {
    let (headers, body) = response
        .split_once("\r\n\r\n")
        .ok_or_else(|| ClassifyError::Http(0, "invalid http response".to_string()))?;

    let status = headers
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| ClassifyError::Http(0, "missing status line".to_string()))?;

    Ok((status, body))
}

use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use tracing::{debug, warn};

use super::{Connection, Connector, DisconnectMode};
use crate::config::ConnectionParams;
use crate::error::{ConnectionError, ConnectionResult};
use crate::song::{Song, Tag};

/// Opens [`MpdConnection`]s over TCP
#[derive(Debug, Clone, Default)]
pub struct MpdConnector;

impl Connector for MpdConnector {
    fn connect(&self, params: &ConnectionParams) -> ConnectionResult<Box<dyn Connection>> {
        Ok(Box::new(MpdConnection::connect(params)?))
    }
}

/// Blocking client for the MPD line protocol
pub struct MpdConnection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
    server_version: String,
    in_response: bool,
    /// `file:` value that opened the next song while reading the previous one
    pending_uri: Option<String>,
}

impl MpdConnection {
    pub fn connect(params: &ConnectionParams) -> ConnectionResult<Self> {
        let stream = open_stream(params)?;
        stream.set_read_timeout(Some(params.timeout))?;
        stream.set_write_timeout(Some(params.timeout))?;
        let writer = stream.try_clone()?;

        let mut conn = Self {
            reader: BufReader::new(stream),
            writer,
            server_version: String::new(),
            in_response: false,
            pending_uri: None,
        };

        let greeting = conn.read_line()?;
        conn.server_version = greeting
            .strip_prefix("OK MPD ")
            .ok_or_else(|| ConnectionError::UnexpectedResponse(greeting.clone()))?
            .to_string();
        debug!(
            "Connected to {} (protocol {})",
            params.address(),
            conn.server_version
        );

        if let Some(password) = &params.password {
            conn.command(&format!("password {}", quote(password)))?;
        }

        Ok(conn)
    }

    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    /// Send a command and wait for its `OK`
    fn command(&mut self, command: &str) -> ConnectionResult<()> {
        self.send(command)?;
        loop {
            let line = self.read_line()?;
            if line == "OK" {
                return Ok(());
            }
            if let Some(ack) = line.strip_prefix("ACK ") {
                return Err(parse_ack(ack));
            }
        }
    }

    fn send(&mut self, command: &str) -> ConnectionResult<()> {
        self.writer.write_all(command.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> ConnectionResult<String> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(ConnectionError::Closed);
        }
        if line.ends_with('\n') {
            line.pop();
        }
        Ok(line)
    }
}

impl Connection for MpdConnection {
    fn search_window(&mut self, start: u32, end: u32) -> ConnectionResult<()> {
        if self.in_response {
            return Err(ConnectionError::UnexpectedResponse(
                "previous response not finished".to_string(),
            ));
        }
        // An empty uri constraint matches every song in the database
        self.send(&format!("search file \"\" window {start}:{end}"))?;
        self.in_response = true;
        self.pending_uri = None;
        Ok(())
    }

    fn recv_song(&mut self) -> ConnectionResult<Option<Song>> {
        if !self.in_response {
            return Ok(None);
        }

        let mut song = self.pending_uri.take().map(Song::new);
        loop {
            let line = self.read_line()?;
            if line == "OK" {
                self.in_response = false;
                return Ok(song);
            }
            if let Some(ack) = line.strip_prefix("ACK ") {
                self.in_response = false;
                return Err(parse_ack(ack));
            }

            let (key, value) = line
                .split_once(": ")
                .ok_or_else(|| ConnectionError::UnexpectedResponse(line.clone()))?;

            if key == "file" {
                if song.is_some() {
                    self.pending_uri = Some(value.to_string());
                    return Ok(song);
                }
                song = Some(Song::new(value));
                continue;
            }

            let Some(current) = song.as_mut() else {
                debug!("Ignoring line outside of a song: {}", line);
                continue;
            };
            match key {
                "duration" => current.duration = value.parse().ok(),
                "Last-Modified" => current.last_modified = Some(value.to_string()),
                _ => {
                    if let Ok(tag) = key.parse::<Tag>() {
                        current.add_tag(tag, value);
                    }
                }
            }
        }
    }

    fn finish(&mut self) -> ConnectionResult<()> {
        while self.in_response {
            self.recv_song()?;
        }
        self.pending_uri = None;
        Ok(())
    }

    fn cancel(&mut self) {
        if let Err(e) = self.finish() {
            warn!("Error while discarding response: {}", e);
        }
        self.in_response = false;
        self.pending_uri = None;
    }

    fn disconnect(&mut self, mode: DisconnectMode) {
        if mode == DisconnectMode::Graceful {
            let _ = self.send("close");
        }
        let _ = self.writer.shutdown(Shutdown::Both);
        self.in_response = false;
        self.pending_uri = None;
    }
}

fn open_stream(params: &ConnectionParams) -> ConnectionResult<TcpStream> {
    let mut last_error = None;
    for addr in params.address().to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, params.timeout) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error
        .map(ConnectionError::Io)
        .unwrap_or_else(|| {
            ConnectionError::UnexpectedResponse(format!(
                "No address found for {}",
                params.address()
            ))
        }))
}

/// Parse the part of an `ACK [code@index] {command} message` line after `ACK `
fn parse_ack(ack: &str) -> ConnectionError {
    let code = ack
        .strip_prefix('[')
        .and_then(|rest| rest.split_once('@'))
        .and_then(|(code, _)| code.parse().ok())
        .unwrap_or(0);
    let command = ack
        .split_once('{')
        .and_then(|(_, rest)| rest.split_once('}'))
        .map(|(command, _)| command.to_string())
        .unwrap_or_default();
    let message = ack
        .split_once("} ")
        .map(|(_, message)| message.to_string())
        .unwrap_or_else(|| ack.to_string());

    ConnectionError::Protocol {
        code,
        command,
        message,
    }
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{escaped}\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    /// Serve one client: send the greeting, then answer each received line
    /// with the next scripted response
    fn fake_server(responses: Vec<&'static str>) -> (ConnectionParams, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"OK MPD 0.23.5\n").unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut received = Vec::new();
            for response in responses {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 {
                    break;
                }
                received.push(line.trim_end().to_string());
                stream.write_all(response.as_bytes()).unwrap();
            }
            let mut rest = String::new();
            let _ = reader.read_to_string(&mut rest);
            received.extend(rest.lines().map(str::to_string));
            received
        });

        let mut params = ConnectionParams::new("127.0.0.1", port);
        params.timeout = Duration::from_secs(5);
        (params, handle)
    }

    #[test]
    fn test_connect_reads_greeting() {
        let (params, server) = fake_server(vec![]);
        let mut conn = MpdConnection::connect(&params).unwrap();
        assert_eq!(conn.server_version(), "0.23.5");
        conn.disconnect(DisconnectMode::Graceful);

        let received = server.join().unwrap();
        assert_eq!(received, vec!["close"]);
    }

    #[test]
    fn test_search_window_parses_songs() {
        let (params, server) = fake_server(vec![
            "file: a.flac\nAlbum: A\nAlbumArtist: X\nduration: 12.5\n\
             file: b.flac\nAlbum: B\nArtist: Y\nLast-Modified: 2023-01-01T00:00:00Z\nOK\n",
        ]);
        let mut conn = MpdConnection::connect(&params).unwrap();
        conn.search_window(0, 1000).unwrap();

        let first = conn.recv_song().unwrap().unwrap();
        assert_eq!(first.uri, "a.flac");
        assert_eq!(first.tag_value(Tag::Album), "A");
        assert_eq!(first.tag_value(Tag::AlbumArtist), "X");
        assert_eq!(first.duration, Some(12.5));

        let second = conn.recv_song().unwrap().unwrap();
        assert_eq!(second.uri, "b.flac");
        assert_eq!(second.tag_value(Tag::AlbumArtist), "Y");
        assert!(second.last_modified.is_some());

        assert!(conn.recv_song().unwrap().is_none());
        conn.finish().unwrap();
        conn.disconnect(DisconnectMode::Instant);

        let received = server.join().unwrap();
        assert_eq!(received[0], "search file \"\" window 0:1000");
    }

    #[test]
    fn test_ack_is_reported_as_protocol_error() {
        let (params, server) = fake_server(vec!["ACK [2@0] {search} incorrect arguments\n"]);
        let mut conn = MpdConnection::connect(&params).unwrap();
        conn.search_window(0, 1000).unwrap();

        match conn.recv_song() {
            Err(ConnectionError::Protocol {
                code,
                command,
                message,
            }) => {
                assert_eq!(code, 2);
                assert_eq!(command, "search");
                assert_eq!(message, "incorrect arguments");
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
        conn.disconnect(DisconnectMode::Instant);
        server.join().unwrap();
    }

    #[test]
    fn test_password_is_sent_quoted() {
        let (mut params, server) = fake_server(vec!["OK\n"]);
        params.password = Some("se\"cret".to_string());
        let mut conn = MpdConnection::connect(&params).unwrap();
        conn.disconnect(DisconnectMode::Instant);

        let received = server.join().unwrap();
        assert_eq!(received[0], "password \"se\\\"cret\"");
    }

    #[test]
    fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut params = ConnectionParams::new("127.0.0.1", port);
        params.timeout = Duration::from_secs(1);
        assert!(MpdConnection::connect(&params).is_err());
    }
}

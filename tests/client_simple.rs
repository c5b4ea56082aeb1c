use h1_client::{ClientState, ErrorKind, Event, Header, HeaderCollection, HttpClient, Uri};

mod common;
use common::{deliver, events, Pipe};

fn client() -> HttpClient<Pipe> {
    common::setup_logger();
    HttpClient::new(Pipe::new())
}

#[test]
fn get_200_ok() {
    let mut client = client();

    client.get(Uri::from_static("http://h:80/p"), HeaderCollection::new());
    assert!(client.response_pending());
    assert_eq!(client.state(), ClientState::Connecting);
    assert_eq!(client.transport().connects, vec![("h".to_owned(), 80)]);

    client.connected();
    assert_eq!(client.state(), ClientState::AwaitingResponse);
    assert_eq!(
        client.transport().written(),
        b"GET /p HTTP/1.1\r\nAccept: *\r\n\r\n".to_vec()
    );

    deliver(&mut client, b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nOK");

    assert_eq!(
        events(&mut client),
        vec![Event::HeadersReady, Event::ContentReady, Event::Finished]
    );
    assert_eq!(client.status_code(), 200);
    assert_eq!(client.consume_content(), b"OK");
    assert_eq!(client.error(), ErrorKind::None);
    assert!(!client.response_pending());
    assert_eq!(client.state(), ClientState::Idle);
}

#[test]
fn post_small_body() {
    let mut client = client();

    let mut headers = HeaderCollection::new();
    headers.push(Header::new("Content-Type", "text/plain"));

    client.post(Uri::from_static("http://h:80/x"), headers, "hi");
    client.connected();

    assert_eq!(client.transport().writes.len(), 1);
    assert_eq!(
        client.transport().written(),
        b"POST /x HTTP/1.1\r\nAccept: *\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nhi"
            .to_vec()
    );

    deliver(&mut client, b"HTTP/1.1 201 Created\r\nContent-Length: 0\r\n\r\n");

    assert_eq!(events(&mut client), vec![Event::HeadersReady, Event::Finished]);
    assert_eq!(client.status_code(), 201);
}

#[test]
fn large_body_writes_twice() {
    let mut client = client();

    let body = vec![b'a'; 8192];
    client.post(Uri::from_static("http://h/upload"), HeaderCollection::new(), body.clone());
    client.connected();

    let writes = &client.transport().writes;
    assert_eq!(writes.len(), 2);
    assert!(writes[0].ends_with(b"\r\n\r\n"));
    assert_eq!(writes[1], body);
}

#[test]
fn target_includes_query() {
    let mut client = client();

    client.get(
        Uri::from_static("http://h/search?q=rust&page=2"),
        HeaderCollection::new(),
    );
    client.connected();

    let head = String::from_utf8(client.transport().written()).unwrap();
    assert!(head.starts_with("GET /search?q=rust&page=2 HTTP/1.1\r\n"));
}

#[test]
fn interim_100_is_swallowed() {
    let mut client = client();

    client.post(Uri::from_static("http://h/upload"), HeaderCollection::new(), "data");
    client.connected();

    deliver(
        &mut client,
        b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n",
    );

    // Exactly one finished, for the real response; the 100 never shows.
    assert_eq!(events(&mut client), vec![Event::HeadersReady, Event::Finished]);
    assert_eq!(client.status_code(), 200);
    assert_eq!(client.error(), ErrorKind::None);
    assert!(!client.response_pending());
}

#[test]
fn interim_100_split_from_real_response() {
    let mut client = client();

    client.post(Uri::from_static("http://h/upload"), HeaderCollection::new(), "data");
    client.connected();

    deliver(&mut client, b"HTTP/1.1 100 Continue\r\n\r\n");
    assert!(client.response_pending());
    assert_eq!(events(&mut client), vec![]);
    assert_eq!(client.state(), ClientState::AwaitingResponse);

    deliver(&mut client, b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok");
    assert_eq!(
        events(&mut client),
        vec![Event::HeadersReady, Event::ContentReady, Event::Finished]
    );
    assert_eq!(client.status_code(), 200);
}

#[test]
fn content_streams_across_reads() {
    let mut client = client();

    client.get(Uri::from_static("http://h/stream"), HeaderCollection::new());
    client.connected();

    deliver(&mut client, b"HTTP/1.1 200 OK\r\nContent-Length: 12\r\n\r\n");
    assert_eq!(events(&mut client), vec![Event::HeadersReady]);

    let mut body = Vec::new();

    deliver(&mut client, b"hello ");
    assert_eq!(events(&mut client), vec![Event::ContentReady]);
    body.extend_from_slice(&client.consume_content());

    deliver(&mut client, b"world!");
    assert_eq!(events(&mut client), vec![Event::ContentReady, Event::Finished]);
    body.extend_from_slice(&client.consume_content());

    assert_eq!(body, b"hello world!");
    assert_eq!(client.error(), ErrorKind::None);
}

#[test]
fn chunked_response_end_to_end() {
    let mut client = client();

    client.get(Uri::from_static("http://h/chunked"), HeaderCollection::new());
    client.connected();

    deliver(
        &mut client,
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n",
    );

    assert_eq!(
        events(&mut client),
        vec![Event::HeadersReady, Event::ContentReady, Event::Finished]
    );
    assert_eq!(client.consume_content(), b"hello");
}

#[test]
fn response_headers_are_surfaced() {
    let mut client = client();

    client.get(Uri::from_static("http://h/p"), HeaderCollection::new());
    client.connected();

    deliver(
        &mut client,
        b"HTTP/1.1 200 OK\r\nServer: pipe\r\nSet-Cookie: a=1\r\nContent-Length: 0\r\n\r\n",
    );
    events(&mut client);

    assert_eq!(client.headers().get(b"server"), Some(&b"pipe"[..]));
    assert_eq!(client.headers().get(b"SET-COOKIE"), Some(&b"a=1"[..]));
    assert_eq!(client.headers().len(), 3);
}

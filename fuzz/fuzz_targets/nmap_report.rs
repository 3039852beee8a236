#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use scanpost_nmap::{HostResult, Hostname, PortResult, ScanResult, normalize};

/// 퍼저용 구조적 nmap 보고서 입력
#[derive(Arbitrary, Debug)]
struct FuzzReport {
    args: Option<String>,
    startstr: Option<String>,
    hosts: Vec<FuzzHost>,
}

#[derive(Arbitrary, Debug)]
struct FuzzHost {
    status: Option<String>,
    addresses: Vec<(Option<String>, Option<String>)>,
    hostnames: Option<Vec<(Option<String>, Option<String>)>>,
    ports: Option<Vec<FuzzPort>>,
}

#[derive(Arbitrary, Debug)]
struct FuzzPort {
    protocol: Option<String>,
    portid: Option<String>,
    state: Option<String>,
    service: Option<FuzzService>,
}

#[derive(Arbitrary, Debug)]
struct FuzzService {
    name: Option<String>,
    product: Option<String>,
    version: Option<String>,
}

/// XML 속성값으로 안전한 문자만 남깁니다 (속성값 정규화 대상인 공백 제어문자 제외).
fn clean(s: &str) -> String {
    s.chars()
        .filter(|&c| c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
        .take(64)
        .collect()
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn attr(name: &str, value: &Option<String>) -> String {
    match value {
        Some(v) => format!(r#" {name}="{}""#, escape(v)),
        None => String::new(),
    }
}

fn cleaned(value: &Option<String>) -> Option<String> {
    value.as_deref().map(clean)
}

fuzz_target!(|input: FuzzReport| {
    let args = cleaned(&input.args);
    let startstr = cleaned(&input.startstr);

    let mut xml = String::from("<?xml version=\"1.0\"?>\n<!DOCTYPE nmaprun>\n<nmaprun");
    xml.push_str(&attr("args", &args));
    xml.push_str(&attr("startstr", &startstr));
    xml.push('>');

    let mut expected_hosts = Vec::new();

    for host in input.hosts.iter().take(16) {
        let status = cleaned(&host.status);
        xml.push_str(&format!("<host><status{}/>", attr("state", &status)));

        let mut addresses = BTreeMap::new();
        for (kind, addr) in host.addresses.iter().take(4) {
            let (kind, addr) = (cleaned(kind), cleaned(addr));
            xml.push_str(&format!(
                "<address{}{}/>",
                attr("addr", &addr),
                attr("addrtype", &kind)
            ));
            // 둘 중 하나라도 없으면 건너뜀
            if let (Some(kind), Some(addr)) = (kind, addr) {
                addresses.insert(kind, addr);
            }
        }

        let mut hostnames = Vec::new();
        if let Some(names) = &host.hostnames {
            xml.push_str("<hostnames>");
            for (name, kind) in names.iter().take(4) {
                let (name, kind) = (cleaned(name), cleaned(kind));
                xml.push_str(&format!(
                    "<hostname{}{}/>",
                    attr("name", &name),
                    attr("type", &kind)
                ));
                hostnames.push(Hostname { name, kind });
            }
            xml.push_str("</hostnames>");
        }

        let mut ports = Vec::new();
        if let Some(fuzz_ports) = &host.ports {
            xml.push_str("<ports>");
            for p in fuzz_ports.iter().take(32) {
                let (protocol, portid, state) = (cleaned(&p.protocol), cleaned(&p.portid), cleaned(&p.state));
                xml.push_str(&format!(
                    "<port{}{}><state{}/>",
                    attr("protocol", &protocol),
                    attr("portid", &portid),
                    attr("state", &state)
                ));

                let mut port = PortResult {
                    protocol,
                    portid,
                    state,
                    ..Default::default()
                };
                if let Some(svc) = &p.service {
                    port.service_name = cleaned(&svc.name);
                    port.product = cleaned(&svc.product);
                    port.version = cleaned(&svc.version);
                    xml.push_str("<service");
                    xml.push_str(&attr("name", &port.service_name));
                    xml.push_str(&attr("product", &port.product));
                    xml.push_str(&attr("version", &port.version));
                    xml.push_str("/>");
                }
                xml.push_str("</port>");
                ports.push(port);
            }
            xml.push_str("</ports>");
        }

        xml.push_str("</host>");
        expected_hosts.push(HostResult {
            status,
            addresses,
            hostnames,
            ports,
        });
    }
    xml.push_str("</nmaprun>");

    // status/state 요소를 갖춘 문서는 속성 누락과 무관하게 정규화되어야 함
    let result = normalize(xml.as_bytes()).expect("well-formed report must normalize");
    let expected = ScanResult {
        scan_args: args.unwrap_or_default(),
        start_time: startstr.unwrap_or_default(),
        hosts: expected_hosts,
    };
    assert_eq!(result, expected);
});

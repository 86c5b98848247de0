//! Traffic manager resource
//!
//! One cluster member. Its `basic` section carries the top-level attributes,
//! several of them under camel-case remote names. Every other section is a
//! single-instance block that the appliance replaces as a whole.

use async_trait::async_trait;
use tfplug::resource::{
    ConfigureResourceRequest, ConfigureResourceResponse, CreateResourceRequest,
    CreateResourceResponse, DeleteResourceRequest, DeleteResourceResponse,
    ImportResourceStateRequest, ImportResourceStateResponse, ReadResourceRequest,
    ReadResourceResponse, Resource, ResourceMetadataRequest, ResourceMetadataResponse,
    ResourceSchemaRequest, ResourceSchemaResponse, ResourceWithConfigure,
    ResourceWithImportState, UpdateResourceRequest, UpdateResourceResponse,
    ValidateResourceConfigRequest, ValidateResourceConfigResponse,
};
use tfplug::schema::{
    AttributeBuilder, AttributeType, NestedBlock, NestedBlockBuilder, NestingMode, Schema,
    SchemaBuilder,
};
use tfplug::types::AttributePath;
use tfplug::validator::{IntRangeValidator, StringInValidator, StringPatternValidator};
use tfplug::import_state_passthrough_id;

use super::lifecycle::{self, ResourceLayout};
use crate::provider_data::{configure_resource, VtmProviderData};
use crate::util::{FieldSpec, Granularity, SectionSpec, TableSpec};

pub const TYPE_NAME: &str = "vtm_traffic_manager";

static APPLIANCE_CARD: TableSpec = TableSpec {
    fields: &[
        FieldSpec::string("name"),
        FieldSpec::list("interfaces"),
        FieldSpec::string("label"),
    ],
    key: Some("name"),
    ordered: true,
};

static APPLIANCE_SYSCTL: TableSpec = TableSpec {
    fields: &[
        FieldSpec::string("sysctl"),
        FieldSpec::string("description"),
        FieldSpec::string("value"),
    ],
    key: Some("sysctl"),
    ordered: true,
};

static TRAFFICIP: TableSpec = TableSpec {
    fields: &[FieldSpec::string("name"), FieldSpec::list("networks")],
    key: Some("name"),
    ordered: true,
};

pub static BASIC: SectionSpec = SectionSpec {
    block: None,
    remote: "basic",
    fields: &[
        FieldSpec::string("admin_master_xmlip")
            .remote("adminMasterXMLIP")
            .always_sent(),
        FieldSpec::string("admin_slave_xmlip")
            .remote("adminSlaveXMLIP")
            .always_sent(),
        FieldSpec::table("appliance_card", &APPLIANCE_CARD),
        FieldSpec::table("appliance_sysctl", &APPLIANCE_SYSCTL),
        FieldSpec::string("authentication_server_ip")
            .remote("authenticationServerIP")
            .always_sent(),
        FieldSpec::string("cloud_platform"),
        FieldSpec::string("location").always_sent(),
        FieldSpec::string("nameip").always_sent(),
        FieldSpec::int("num_aptimizer_threads").always_sent(),
        FieldSpec::int("num_children").always_sent(),
        FieldSpec::int("number_of_cpus")
            .remote("numberOfCPUs")
            .always_sent(),
        FieldSpec::int("rest_server_port")
            .remote("restServerPort")
            .always_sent(),
        FieldSpec::bool("start_sysd").read_only(),
        FieldSpec::table("trafficip", &TRAFFICIP),
        FieldSpec::string("updater_ip").remote("updaterIP").always_sent(),
    ],
    granularity: Granularity::Field,
};

static HOSTS: TableSpec = TableSpec {
    fields: &[FieldSpec::string("name"), FieldSpec::string("ip_address")],
    key: Some("name"),
    ordered: true,
};

static INTERFACES: TableSpec = TableSpec {
    fields: &[
        FieldSpec::string("name"),
        FieldSpec::bool("autoneg"),
        FieldSpec::string("bmode"),
        FieldSpec::string("bond"),
        FieldSpec::bool("duplex"),
        FieldSpec::int("mtu"),
        FieldSpec::string("speed"),
    ],
    key: Some("name"),
    ordered: true,
};

static IPS: TableSpec = TableSpec {
    fields: &[
        FieldSpec::string("name"),
        FieldSpec::string("addr"),
        FieldSpec::bool("isexternal"),
        FieldSpec::string("mask"),
    ],
    key: Some("name"),
    ordered: true,
};

static ROUTES: TableSpec = TableSpec {
    fields: &[
        FieldSpec::string("name"),
        FieldSpec::string("gw"),
        FieldSpec::string("if"),
        FieldSpec::string("mask"),
    ],
    key: Some("name"),
    ordered: true,
};

pub static APPLIANCE: SectionSpec = SectionSpec {
    block: Some("appliance"),
    remote: "appliance",
    fields: &[
        FieldSpec::string("gateway_ipv4"),
        FieldSpec::string("gateway_ipv6"),
        FieldSpec::string("hostname").read_only(),
        FieldSpec::table("hosts", &HOSTS),
        FieldSpec::table("if", &INTERFACES),
        FieldSpec::table("ip", &IPS),
        FieldSpec::bool("ipmi_lan_access"),
        FieldSpec::string("ipmi_lan_addr"),
        FieldSpec::string("ipmi_lan_gateway"),
        FieldSpec::string("ipmi_lan_ipsrc"),
        FieldSpec::string("ipmi_lan_mask"),
        FieldSpec::bool("ipv4_forwarding"),
        FieldSpec::bool("ipv6_forwarding"),
        FieldSpec::bool("licence_agreed"),
        FieldSpec::bool("manageazureroutes"),
        FieldSpec::bool("manageec2conf"),
        FieldSpec::bool("manageiptrans"),
        FieldSpec::bool("managereturnpath"),
        FieldSpec::bool("managevpcconf"),
        FieldSpec::list("name_servers"),
        FieldSpec::list("ntpservers"),
        FieldSpec::table("routes", &ROUTES),
        FieldSpec::list("search_domains"),
        FieldSpec::string("shim_client_id"),
        FieldSpec::string("shim_client_key"),
        FieldSpec::bool("shim_enabled"),
        FieldSpec::string("shim_ips"),
        FieldSpec::string("shim_load_balance"),
        FieldSpec::string("shim_log_level"),
        FieldSpec::string("shim_mode"),
        FieldSpec::string("shim_portal_url"),
        FieldSpec::string("shim_proxy_host"),
        FieldSpec::string("shim_proxy_port"),
        FieldSpec::bool("ssh_enabled"),
        FieldSpec::bool("ssh_password_allowed"),
        FieldSpec::int("ssh_port"),
        FieldSpec::string("timezone"),
        FieldSpec::list("vlans"),
    ],
    granularity: Granularity::Section,
};

pub static AUTODISCOVER: SectionSpec = SectionSpec {
    block: Some("autodiscover"),
    remote: "autodiscover",
    fields: &[FieldSpec::string("product_id")],
    granularity: Granularity::Section,
};

pub static CLUSTER_COMMS: SectionSpec = SectionSpec {
    block: Some("cluster_comms"),
    remote: "cluster_comms",
    fields: &[
        FieldSpec::bool("allow_update"),
        FieldSpec::string("bind_ip"),
        FieldSpec::string("external_ip"),
        FieldSpec::int("port"),
    ],
    granularity: Granularity::Section,
};

pub static EC2: SectionSpec = SectionSpec {
    block: Some("ec2"),
    remote: "ec2",
    fields: &[
        FieldSpec::string("availability_zone"),
        FieldSpec::string("instanceid"),
        FieldSpec::list("trafficips_public_enis"),
        FieldSpec::string("vpcid"),
    ],
    granularity: Granularity::Section,
};

pub static FAULT_TOLERANCE: SectionSpec = SectionSpec {
    block: Some("fault_tolerance"),
    remote: "fault_tolerance",
    fields: &[
        FieldSpec::string("bgp_router_id"),
        FieldSpec::string("ospfv2_ip"),
        FieldSpec::list("ospfv2_neighbor_addrs"),
        FieldSpec::bool("rhi_support"),
    ],
    granularity: Granularity::Section,
};

pub static IPTABLES: SectionSpec = SectionSpec {
    block: Some("iptables"),
    remote: "iptables",
    fields: &[FieldSpec::bool("config_enabled")],
    granularity: Granularity::Section,
};

pub static IPTRANS: SectionSpec = SectionSpec {
    block: Some("iptrans"),
    remote: "iptrans",
    fields: &[
        FieldSpec::int("fwmark"),
        FieldSpec::bool("config_enabled"),
        FieldSpec::bool("iptables_enabled"),
        FieldSpec::int("routing_table"),
    ],
    granularity: Granularity::Section,
};

pub static JAVA: SectionSpec = SectionSpec {
    block: Some("java"),
    remote: "java",
    fields: &[FieldSpec::int("port")],
    granularity: Granularity::Section,
};

pub static KERBEROS: SectionSpec = SectionSpec {
    block: Some("kerberos"),
    remote: "kerberos",
    fields: &[
        FieldSpec::string("hostname"),
        FieldSpec::int("num_kpt_threads"),
    ],
    granularity: Granularity::Section,
};

pub static REMOTE_LICENSING: SectionSpec = SectionSpec {
    block: Some("remote_licensing"),
    remote: "remote_licensing",
    fields: &[
        FieldSpec::string("email_address"),
        FieldSpec::string("message"),
    ],
    granularity: Granularity::Section,
};

pub static REST_API: SectionSpec = SectionSpec {
    block: Some("rest_api"),
    remote: "rest_api",
    fields: &[
        FieldSpec::list("bind_ips").read_only(),
        FieldSpec::int("port"),
    ],
    granularity: Granularity::Section,
};

pub static SNMP: SectionSpec = SectionSpec {
    block: Some("snmp"),
    remote: "snmp",
    fields: &[
        FieldSpec::list("allow"),
        FieldSpec::string("auth_password"),
        FieldSpec::string("bind_ip"),
        FieldSpec::string("community"),
        FieldSpec::bool("enabled"),
        FieldSpec::string("hash_algorithm"),
        FieldSpec::string("port"),
        FieldSpec::string("priv_password"),
        FieldSpec::string("security_level"),
        FieldSpec::string("username"),
    ],
    granularity: Granularity::Section,
};

pub static LAYOUT: ResourceLayout = ResourceLayout {
    type_name: TYPE_NAME,
    api_path: "traffic_managers",
    sections: &[
        &BASIC,
        &APPLIANCE,
        &AUTODISCOVER,
        &CLUSTER_COMMS,
        &EC2,
        &FAULT_TOLERANCE,
        &IPTABLES,
        &IPTRANS,
        &JAVA,
        &KERBEROS,
        &REMOTE_LICENSING,
        &REST_API,
        &SNMP,
    ],
};

fn unsigned(name: &str) -> IntRangeValidator {
    IntRangeValidator::new(0, i64::from(u32::MAX))
        .message(&format!("{} must be a positive integer", name))
}

fn port(name: &str) -> IntRangeValidator {
    IntRangeValidator::new(1, 65535)
        .message(&format!("{} must be a valid port number within 1-65535", name))
}

fn string(name: &str, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::String)
        .description(description)
        .optional()
}

fn boolean(name: &str, description: &str, default: bool) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::Bool)
        .description(description)
        .optional()
        .default_bool(default)
}

fn number(name: &str, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::Number)
        .description(description)
        .optional()
}

fn strings(name: &str, description: &str) -> AttributeBuilder {
    AttributeBuilder::new(name, AttributeType::list_of_strings())
        .description(description)
        .optional()
}

fn table(name: &str, description: &str) -> NestedBlockBuilder {
    NestedBlockBuilder::new(name, NestingMode::List).description(description)
}

fn appliance_block() -> NestedBlock {
    NestedBlockBuilder::single("appliance")
        .description("Appliance specific settings")
        .attribute(string("gateway_ipv4", "The default gateway").build())
        .attribute(string("gateway_ipv6", "The default IPv6 gateway").build())
        .attribute(
            AttributeBuilder::new("hostname", AttributeType::String)
                .description("Name (hostname.domainname) of the appliance")
                .computed()
                .build(),
        )
        .block(
            table(
                "hosts",
                "Hostname to static IP address mappings placed in /etc/hosts",
            )
            .attribute(
                string("name", "The name of a host")
                    .required()
                    .build(),
            )
            .attribute(
                string("ip_address", "The static IP address of the host")
                    .required()
                    .build(),
            )
            .build(),
        )
        .block(
            table("if", "Network interface specific settings")
                .attribute(string("name", "A network interface name").required().build())
                .attribute(
                    boolean(
                        "autoneg",
                        "Whether auto-negotiation should be enabled for the interface",
                        true,
                    )
                    .build(),
                )
                .attribute(
                    string("bmode", "The trunking mode of the interface")
                        .default_string("802_3ad")
                        .validator(StringInValidator::new(&["802_3ad"]))
                        .build(),
                )
                .attribute(
                    string("bond", "The trunk of which the interface should be a member")
                        .validator(StringPatternValidator::new(
                            r"^(bond\d+)?$",
                            "a bond name matching ^(bond\\d+)?$",
                        ))
                        .build(),
                )
                .attribute(
                    boolean(
                        "duplex",
                        "Whether full-duplex should be enabled for the interface",
                        true,
                    )
                    .build(),
                )
                .attribute(
                    number("mtu", "The maximum transmission unit (MTU) of the interface")
                        .default_number(1500.0)
                        .validator(unsigned("mtu"))
                        .build(),
                )
                .attribute(
                    string("speed", "The speed of the interface")
                        .default_string("1000")
                        .validator(
                            StringInValidator::new(&["10", "100", "1000"])
                                .message("speed must be one of 10, 100 or 1000"),
                        )
                        .build(),
                )
                .build(),
        )
        .block(
            table("ip", "Network interfaces and their network settings")
                .attribute(string("name", "A network interface name").required().build())
                .attribute(
                    string("addr", "The IP address for the interface")
                        .required()
                        .build(),
                )
                .attribute(
                    boolean(
                        "isexternal",
                        "Whether the interface is externally facing",
                        false,
                    )
                    .build(),
                )
                .attribute(
                    string("mask", "The IP mask (netmask) for the interface")
                        .required()
                        .build(),
                )
                .build(),
        )
        .attribute(
            boolean(
                "ipmi_lan_access",
                "Whether IPMI LAN access should be enabled or not",
                false,
            )
            .build(),
        )
        .attribute(string("ipmi_lan_addr", "The IP address of the appliance IPMI LAN channel").build())
        .attribute(string("ipmi_lan_gateway", "The default gateway of the IPMI LAN channel").build())
        .attribute(
            string("ipmi_lan_ipsrc", "How the IPMI LAN channel gets its address")
                .default_string("static")
                .validator(
                    StringInValidator::new(&["dhcp", "static"])
                        .message("ipmi_lan_ipsrc must be one of dhcp or static"),
                )
                .build(),
        )
        .attribute(string("ipmi_lan_mask", "The IP netmask for the IPMI LAN channel").build())
        .attribute(boolean("ipv4_forwarding", "Whether or not IPv4 forwarding is enabled", false).build())
        .attribute(boolean("ipv6_forwarding", "Whether or not IPv6 forwarding is enabled", false).build())
        .attribute(
            boolean(
                "licence_agreed",
                "Whether or not the license agreement has been accepted",
                false,
            )
            .build(),
        )
        .attribute(
            boolean(
                "manageazureroutes",
                "Whether or not the software manages the Azure policy routing",
                true,
            )
            .build(),
        )
        .attribute(
            boolean(
                "manageec2conf",
                "Whether or not the software manages the EC2 config",
                true,
            )
            .build(),
        )
        .attribute(
            boolean(
                "manageiptrans",
                "Whether or not the software manages the IP transparency",
                true,
            )
            .build(),
        )
        .attribute(
            boolean(
                "managereturnpath",
                "Whether or not the software manages return path routing",
                true,
            )
            .build(),
        )
        .attribute(
            boolean(
                "managevpcconf",
                "Whether or not the software manages the EC2-VPC secondary IPs",
                true,
            )
            .build(),
        )
        .attribute(strings("name_servers", "The nameservers placed in /etc/resolv.conf").build())
        .attribute(
            strings(
                "ntpservers",
                "The NTP servers the appliance should use to synchronize its clock",
            )
            .computed()
            .build(),
        )
        .block(
            table("routes", "Destination IP addresses and routing details to reach them")
                .attribute(string("name", "A destination IP address").required().build())
                .attribute(
                    string("gw", "The gateway IP to configure for the route")
                        .required()
                        .build(),
                )
                .attribute(
                    string("if", "The network interface to configure for the route")
                        .required()
                        .build(),
                )
                .attribute(
                    string("mask", "The netmask to apply to the IP address")
                        .required()
                        .build(),
                )
                .build(),
        )
        .attribute(strings("search_domains", "The search domains placed in /etc/resolv.conf").build())
        .attribute(string("shim_client_id", "The client ID provided by the portal for this server").build())
        .attribute(
            string("shim_client_key", "The client key provided by the portal for this server")
                .sensitive()
                .build(),
        )
        .attribute(
            boolean(
                "shim_enabled",
                "Enable the Riverbed Cloud SteelHead discovery agent on this appliance",
                false,
            )
            .build(),
        )
        .attribute(string("shim_ips", "The IP addresses of the Riverbed Cloud SteelHeads to use").build())
        .attribute(
            string(
                "shim_load_balance",
                "The load balancing method for selecting a Riverbed Cloud SteelHead appliance",
            )
            .default_string("round_robin")
            .validator(
                StringInValidator::new(&["priority", "round_robin"])
                    .message("shim_load_balance must be one of priority or round_robin"),
            )
            .build(),
        )
        .attribute(
            string(
                "shim_log_level",
                "The minimum severity that the discovery agent will record to its log",
            )
            .default_string("notice")
            .validator(StringInValidator::new(&[
                "critical", "debug", "info", "notice", "serious", "warning",
            ]))
            .build(),
        )
        .attribute(
            string(
                "shim_mode",
                "The mode used to discover Riverbed Cloud SteelHeads",
            )
            .default_string("portal")
            .validator(
                StringInValidator::new(&["local", "manual", "portal"])
                    .message("shim_mode must be one of local, manual or portal"),
            )
            .build(),
        )
        .attribute(string("shim_portal_url", "The hostname or IP address of the local portal to use").build())
        .attribute(string("shim_proxy_host", "The proxy server used to connect to the portal").build())
        .attribute(string("shim_proxy_port", "The port of the proxy server").build())
        .attribute(boolean("ssh_enabled", "Whether or not the SSH server is enabled on the appliance", true).build())
        .attribute(
            boolean(
                "ssh_password_allowed",
                "Whether or not the SSH server allows password based login",
                true,
            )
            .build(),
        )
        .attribute(
            number("ssh_port", "The port that the SSH server should listen on")
                .default_number(22.0)
                .validator(port("ssh_port"))
                .build(),
        )
        .attribute(
            string("timezone", "The timezone the appliance should use")
                .default_string("US/Pacific")
                .build(),
        )
        .attribute(strings("vlans", "The VLANs the software should raise").build())
        .build()
}

fn section_blocks() -> Vec<NestedBlock> {
    vec![
        NestedBlockBuilder::single("autodiscover")
            .attribute(
                string(
                    "product_id",
                    "Product ID used by traffic managers to discover each other when clustering",
                )
                .default_string("ZXTM")
                .build(),
            )
            .build(),
        NestedBlockBuilder::single("cluster_comms")
            .attribute(
                boolean(
                    "allow_update",
                    "Whether this instance can send configuration updates to other cluster members",
                    false,
                )
                .build(),
            )
            .attribute(
                string("bind_ip", "The IP address to bind to for internal administration")
                    .default_string("*")
                    .build(),
            )
            .attribute(string("external_ip", "The optional external IP of the traffic manager").build())
            .attribute(
                number("port", "The port to listen on for internal administration")
                    .default_number(9080.0)
                    .validator(port("port"))
                    .build(),
            )
            .build(),
        NestedBlockBuilder::single("ec2")
            .attribute(string("availability_zone", "The availability zone of this EC2 instance").build())
            .attribute(string("instanceid", "The EC2 instance ID of this virtual appliance").build())
            .attribute(
                strings(
                    "trafficips_public_enis",
                    "MAC addresses of interfaces used to associate elastic IPs",
                )
                .build(),
            )
            .attribute(string("vpcid", "The ID of the VPC the instance is in").build())
            .build(),
        NestedBlockBuilder::single("fault_tolerance")
            .attribute(string("bgp_router_id", "The BGP router id").build())
            .attribute(string("ospfv2_ip", "The permanent IPv4 address used as OSPF router ID").build())
            .attribute(
                strings(
                    "ospfv2_neighbor_addrs",
                    "Routers expected to be found as OSPFv2 neighbors",
                )
                .build(),
            )
            .attribute(boolean("rhi_support", "This key does nothing", false).build())
            .build(),
        NestedBlockBuilder::single("iptables")
            .attribute(
                boolean(
                    "config_enabled",
                    "Whether the traffic manager manages iptables configuration",
                    false,
                )
                .build(),
            )
            .build(),
        NestedBlockBuilder::single("iptrans")
            .attribute(
                number("fwmark", "The netfilter forwarding mark for IP transparency rules")
                    .default_number(320.0)
                    .validator(unsigned("fwmark"))
                    .build(),
            )
            .attribute(
                boolean(
                    "config_enabled",
                    "Whether IP transparency may be used via netfilter/iptables",
                    false,
                )
                .build(),
            )
            .attribute(
                boolean(
                    "iptables_enabled",
                    "Whether IP transparency may use the iptables socket extension",
                    false,
                )
                .build(),
            )
            .attribute(
                number("routing_table", "The routing table ID for IP transparency rules")
                    .default_number(320.0)
                    .validator(unsigned("routing_table"))
                    .build(),
            )
            .build(),
        NestedBlockBuilder::single("java")
            .attribute(
                number("port", "The port the Java Extension handler should listen on")
                    .default_number(9060.0)
                    .validator(unsigned("port"))
                    .build(),
            )
            .build(),
        NestedBlockBuilder::single("kerberos")
            .attribute(string("hostname", "The hostname to use in Kerberos principal names").build())
            .attribute(
                number(
                    "num_kpt_threads",
                    "Worker threads of the Kerberos Protocol Transition helper",
                )
                .validator(unsigned("num_kpt_threads"))
                .build(),
            )
            .build(),
        NestedBlockBuilder::single("remote_licensing")
            .attribute(string("email_address", "E-mail address sent with a remote licensing request").build())
            .attribute(string("message", "Free text sent with a remote licensing request").build())
            .build(),
        NestedBlockBuilder::single("rest_api")
            .attribute(
                AttributeBuilder::new("bind_ips", AttributeType::list_of_strings())
                    .description("IP addresses the REST API listens on")
                    .computed()
                    .build(),
            )
            .attribute(
                number("port", "The port on which the REST API listens")
                    .default_number(9070.0)
                    .validator(port("port"))
                    .build(),
            )
            .build(),
        NestedBlockBuilder::single("snmp")
            .attribute(strings("allow", "Addresses allowed to use the SNMP command responder").build())
            .attribute(string("auth_password", "The SNMPv3 authentication password").sensitive().build())
            .attribute(
                string("bind_ip", "The IP address the SNMP service binds to")
                    .default_string("*")
                    .build(),
            )
            .attribute(
                string("community", "The community string for SNMPv1 and SNMPv2c")
                    .default_string("public")
                    .build(),
            )
            .attribute(boolean("enabled", "Whether the SNMP command responder is enabled", false).build())
            .attribute(
                string("hash_algorithm", "The hash algorithm for authenticated SNMPv3")
                    .default_string("md5")
                    .validator(
                        StringInValidator::new(&["md5", "sha1"])
                            .message("hash_algorithm must be one of md5 or sha1"),
                    )
                    .build(),
            )
            .attribute(
                string("port", "The port the SNMP command responder listens on")
                    .default_string("default")
                    .build(),
            )
            .attribute(string("priv_password", "The SNMPv3 privacy password").sensitive().build())
            .attribute(
                string("security_level", "The security level for SNMPv3 communications")
                    .default_string("noauthnopriv")
                    .validator(StringInValidator::new(&[
                        "noauthnopriv",
                        "authnopriv",
                        "authpriv",
                    ]))
                    .build(),
            )
            .attribute(string("username", "The username required for SNMPv3 commands").build())
            .build(),
    ]
}

#[derive(Default)]
pub struct TrafficManagerResource {
    provider_data: Option<VtmProviderData>,
}

impl TrafficManagerResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema_static() -> Schema {
        let mut builder = SchemaBuilder::new()
            .version(0)
            .description("Manages a traffic manager of a vTM cluster")
            .attribute(
                AttributeBuilder::new("name", AttributeType::String)
                    .description("Name of the traffic manager")
                    .required()
                    .requires_replace()
                    .build(),
            )
            .attribute(
                string("admin_master_xmlip", "The Application Firewall master XML IP")
                    .default_string("0.0.0.0")
                    .build(),
            )
            .attribute(
                string("admin_slave_xmlip", "The Application Firewall slave XML IP")
                    .default_string("0.0.0.0")
                    .build(),
            )
            .block(
                table("appliance_card", "The network cards of a hardware appliance")
                    .attribute(string("name", "Network card PCI ID").required().build())
                    .attribute(
                        strings("interfaces", "The order of the interfaces of a network card")
                            .build(),
                    )
                    .attribute(
                        string("label", "The label of the installed network card")
                            .required()
                            .validator(StringPatternValidator::new(
                                r"^[\w.:@\-]{1,64}$",
                                "a valid network interface card label",
                            ))
                            .build(),
                    )
                    .build(),
            )
            .block(
                table(
                    "appliance_sysctl",
                    "Custom kernel parameters applied with the sysctl interface",
                )
                .attribute(
                    string("sysctl", "The name of the kernel parameter, e.g. net.ipv4.forward")
                        .required()
                        .build(),
                )
                .attribute(string("description", "Optional description for the sysctl").build())
                .attribute(string("value", "The value of the kernel parameter").build())
                .build(),
            )
            .attribute(
                string(
                    "authentication_server_ip",
                    "The Application Firewall Authentication Server IP",
                )
                .default_string("0.0.0.0")
                .build(),
            )
            .attribute(string("cloud_platform", "Cloud platform where the traffic manager is running").build())
            .attribute(string("location", "The location the local traffic manager is in").build())
            .attribute(string("nameip", "Replace the traffic manager name with an IP address").build())
            .attribute(
                number(
                    "num_aptimizer_threads",
                    "Worker threads the Web Accelerator process should create",
                )
                .validator(unsigned("num_aptimizer_threads"))
                .build(),
            )
            .attribute(
                number("num_children", "The number of worker processes the software will run")
                    .default_number(0.0)
                    .validator(unsigned("num_children"))
                    .build(),
            )
            .attribute(
                number(
                    "number_of_cpus",
                    "The number of Application Firewall decider processes to run",
                )
                .default_number(0.0)
                .validator(unsigned("number_of_cpus"))
                .build(),
            )
            .attribute(
                number(
                    "rest_server_port",
                    "The Application Firewall REST internal API port",
                )
                .default_number(0.0)
                .validator(unsigned("rest_server_port"))
                .build(),
            )
            .attribute(
                AttributeBuilder::new("start_sysd", AttributeType::Bool)
                    .description("Whether or not to start the sysd process on software installations")
                    .computed()
                    .build(),
            )
            .block(
                table("trafficip", "Network interfaces and the networks they map to")
                    .attribute(string("name", "A network interface").required().build())
                    .attribute(
                        strings("networks", "IP/masks to which the network interface maps")
                            .build(),
                    )
                    .build(),
            )
            .attribute(
                string("updater_ip", "The Application Firewall Updater IP")
                    .default_string("0.0.0.0")
                    .build(),
            )
            .block(appliance_block());

        for block in section_blocks() {
            builder = builder.block(block);
        }
        builder.build()
    }
}

#[async_trait]
impl Resource for TrafficManagerResource {
    fn type_name(&self) -> &str {
        TYPE_NAME
    }

    async fn metadata(&self, _request: ResourceMetadataRequest) -> ResourceMetadataResponse {
        ResourceMetadataResponse {
            type_name: self.type_name().to_string(),
        }
    }

    async fn schema(&self, _request: ResourceSchemaRequest) -> ResourceSchemaResponse {
        ResourceSchemaResponse {
            schema: Self::schema_static(),
            diagnostics: vec![],
        }
    }

    async fn validate(
        &self,
        request: ValidateResourceConfigRequest,
    ) -> ValidateResourceConfigResponse {
        let (_, diagnostics) = lifecycle::prepare(&Self::schema_static(), request.config);
        ValidateResourceConfigResponse { diagnostics }
    }

    async fn create(&self, request: CreateResourceRequest) -> CreateResourceResponse {
        match &self.provider_data {
            Some(data) => {
                lifecycle::create(
                    data.client.as_ref(),
                    &LAYOUT,
                    &Self::schema_static(),
                    request,
                )
                .await
            }
            None => CreateResourceResponse {
                new_state: request.planned_state,
                diagnostics: vec![lifecycle::not_configured()],
            },
        }
    }

    async fn read(&self, request: ReadResourceRequest) -> ReadResourceResponse {
        match &self.provider_data {
            Some(data) => lifecycle::read(data.client.as_ref(), &LAYOUT, request).await,
            None => ReadResourceResponse {
                new_state: Some(request.current_state),
                diagnostics: vec![lifecycle::not_configured()],
            },
        }
    }

    async fn update(&self, request: UpdateResourceRequest) -> UpdateResourceResponse {
        match &self.provider_data {
            Some(data) => {
                lifecycle::update(
                    data.client.as_ref(),
                    &LAYOUT,
                    &Self::schema_static(),
                    request,
                )
                .await
            }
            None => UpdateResourceResponse {
                new_state: request.prior_state,
                diagnostics: vec![lifecycle::not_configured()],
            },
        }
    }

    async fn delete(&self, request: DeleteResourceRequest) -> DeleteResourceResponse {
        match &self.provider_data {
            Some(data) => {
                lifecycle::delete(data.client.as_ref(), TYPE_NAME, LAYOUT.api_path, request).await
            }
            None => DeleteResourceResponse {
                diagnostics: vec![lifecycle::not_configured()],
            },
        }
    }
}

#[async_trait]
impl ResourceWithConfigure for TrafficManagerResource {
    async fn configure(&mut self, request: ConfigureResourceRequest) -> ConfigureResourceResponse {
        configure_resource(TYPE_NAME, request, &mut self.provider_data)
    }
}

#[async_trait]
impl ResourceWithImportState for TrafficManagerResource {
    async fn import_state(
        &self,
        request: ImportResourceStateRequest,
    ) -> ImportResourceStateResponse {
        import_state_passthrough_id(AttributePath::new("name"), &request)
    }
}

#[cfg(test)]
#[path = "./traffic_manager_test.rs"]
mod traffic_manager_test;

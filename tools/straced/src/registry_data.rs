// Static syscall schema table (spec §4.3), `include!`d into `registry.rs`.
//
// Numbers follow the macOS/xnu BSD syscall table (`bsd/kern/syscalls.master`
// in the open-source xnu tree). This table is treated as data the core
// ingests (spec §1: "producing them is not part of the engineering
// design") — entries cover the syscalls spec §8's end-to-end scenarios and
// §4.4's decoder catalogue exercise, not the full ~500-entry table.

const RAW: Decoder = Decoder::Scalar(|v| format!("{v:#x}"));
const SVAL: Decoder = Decoder::Scalar(|v| (v as i64).to_string());
const UVAL: Decoder = Decoder::Scalar(|v| v.to_string());
const CSTR: Decoder = Decoder::PreCallMem(buffer::render_cstring);
const BUF_OUT: Decoder = Decoder::PostCallMem(buffer::render_buffer_default);
const BUF_IN: Decoder = Decoder::PreCallMem(buffer::render_buffer_default);
const STAT_OUT: Decoder = Decoder::PostCallMem(structs::render_stat);
const IOVEC_IN: Decoder = Decoder::PreCallMem(structs::render_iovec_array);
const IOVEC_OUT: Decoder = Decoder::PostCallMem(structs::render_iovec_array);
const MSGHDR_IN: Decoder = Decoder::PreCallMem(structs::render_msghdr);
const MSGHDR_OUT: Decoder = Decoder::PostCallMem(structs::render_msghdr);
const SOCKADDR_IN: Decoder = Decoder::PreCallMem(sockaddr::render_sockaddr);
const SOCKADDR_OUT: Decoder = Decoder::PostCallMem(sockaddr::render_sockaddr);
const SIGACTION_OUT: Decoder = Decoder::PostCallMem(structs::render_sigaction);
const RUSAGE_OUT: Decoder = Decoder::PostCallMem(structs::render_rusage);
const STATFS_OUT: Decoder = Decoder::PostCallMem(structs::render_statfs);
const KEVENT_IO: Decoder = Decoder::PostCallMem(structs::render_kevent);
const OPEN_FLAGS: Decoder = Decoder::Scalar(flags::open_flags);
const OCTAL_MODE: Decoder = Decoder::Scalar(flags::octal_mode);
const MMAP_PROT: Decoder = Decoder::Scalar(flags::mmap_prot);
const MMAP_FLAGS: Decoder = Decoder::Scalar(flags::mmap_flags);
const MSG_FLAGS: Decoder = Decoder::Scalar(flags::msg_flags);
const ACCESS_MODE: Decoder = Decoder::Scalar(flags::access_mode);
const FD_FLAGS: Decoder = Decoder::Scalar(flags::fd_flags);
const SIGNAL: Decoder = Decoder::Scalar(signal::signal_name);

static SYSCALLS: &[SyscallSchema] = &[
    SyscallSchema {
        number: 1,
        name: "exit",
        category: Category::Process,
        params: &[param!("rval", "int", In, SVAL)],
        ret: ReturnDecoder::Raw,
    },
    SyscallSchema {
        number: 2,
        name: "fork",
        category: Category::Process,
        params: &[],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 3,
        name: "read",
        category: Category::File,
        params: &[
            param!("fd", "int", In, SVAL),
            param!("buf", "void *", Out, BUF_OUT, aux = Aux::ReturnValue),
            param!("nbyte", "size_t", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 4,
        name: "write",
        category: Category::File,
        params: &[
            param!("fd", "int", In, SVAL),
            param!("buf", "const void *", In, BUF_IN, aux = Aux::Arg(2)),
            param!("nbyte", "size_t", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 5,
        name: "open",
        category: Category::File,
        params: &[
            param!("path", "const char *", In, CSTR),
            param!("flags", "int", In, OPEN_FLAGS),
            param!("mode", "mode_t", In, OCTAL_MODE),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 6,
        name: "close",
        category: Category::File,
        params: &[param!("fd", "int", In, SVAL)],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 7,
        name: "wait4",
        category: Category::Process,
        params: &[
            param!("pid", "pid_t", In, SVAL),
            param!("status", "int *", Out, BUF_OUT, aux = Aux::None),
            param!("options", "int", In, UVAL),
            param!("rusage", "struct rusage *", Out, RUSAGE_OUT),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 9,
        name: "link",
        category: Category::File,
        params: &[
            param!("path1", "const char *", In, CSTR),
            param!("path2", "const char *", In, CSTR),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 10,
        name: "unlink",
        category: Category::File,
        params: &[param!("path", "const char *", In, CSTR)],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 12,
        name: "chdir",
        category: Category::File,
        params: &[param!("path", "const char *", In, CSTR)],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 15,
        name: "chmod",
        category: Category::File,
        params: &[
            param!("path", "const char *", In, CSTR),
            param!("mode", "mode_t", In, OCTAL_MODE),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 16,
        name: "chown",
        category: Category::File,
        params: &[
            param!("path", "const char *", In, CSTR),
            param!("uid", "uid_t", In, UVAL),
            param!("gid", "gid_t", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 19,
        name: "lseek",
        category: Category::File,
        params: &[
            param!("fd", "int", In, SVAL),
            param!("offset", "off_t", In, SVAL),
            param!("whence", "int", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 20,
        name: "getpid",
        category: Category::Process,
        params: &[],
        ret: ReturnDecoder::Raw,
    },
    SyscallSchema {
        number: 26,
        name: "ptrace",
        category: Category::Debug,
        params: &[
            param!("request", "int", In, UVAL),
            param!("pid", "pid_t", In, SVAL),
            param!("addr", "caddr_t", In, RAW),
            param!("data", "int", In, SVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 27,
        name: "recvmsg",
        category: Category::Network,
        params: &[
            param!("s", "int", In, SVAL),
            param!("msg", "struct msghdr *", InOut, MSGHDR_OUT),
            param!("flags", "int", In, MSG_FLAGS),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 28,
        name: "sendmsg",
        category: Category::Network,
        params: &[
            param!("s", "int", In, SVAL),
            param!("msg", "const struct msghdr *", In, MSGHDR_IN),
            param!("flags", "int", In, MSG_FLAGS),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 29,
        name: "recvfrom",
        category: Category::Network,
        params: &[
            param!("s", "int", In, SVAL),
            param!("buf", "void *", Out, BUF_OUT, aux = Aux::ReturnValue),
            param!("len", "size_t", In, UVAL),
            param!("flags", "int", In, MSG_FLAGS),
            param!("from", "struct sockaddr *", Out, SOCKADDR_OUT),
            param!("fromlenaddr", "socklen_t *", InOut, RAW),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 30,
        name: "accept",
        category: Category::Network,
        params: &[
            param!("s", "int", In, SVAL),
            param!("name", "struct sockaddr *", Out, SOCKADDR_OUT),
            param!("anamelen", "socklen_t *", InOut, RAW),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 33,
        name: "access",
        category: Category::File,
        params: &[
            param!("path", "const char *", In, CSTR),
            param!("amode", "int", In, ACCESS_MODE),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 37,
        name: "kill",
        category: Category::Signal,
        params: &[
            param!("pid", "pid_t", In, SVAL),
            param!("signum", "int", In, SIGNAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 41,
        name: "dup",
        category: Category::File,
        params: &[param!("fd", "int", In, SVAL)],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 42,
        name: "pipe",
        category: Category::Ipc,
        params: &[],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 48,
        name: "sigaction",
        category: Category::Signal,
        params: &[
            param!("signum", "int", In, SIGNAL),
            param!("nsv", "const struct sigaction *", In, RAW),
            param!("osv", "struct sigaction *", Out, SIGACTION_OUT),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 54,
        name: "ioctl",
        category: Category::File,
        params: &[
            param!("fd", "int", In, SVAL),
            param!("com", "unsigned long", In, RAW),
            param!("data", "void *", InOut, RAW),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 57,
        name: "symlink",
        category: Category::File,
        params: &[
            param!("path", "const char *", In, CSTR),
            param!("link", "const char *", In, CSTR),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 58,
        name: "readlink",
        category: Category::File,
        params: &[
            param!("path", "const char *", In, CSTR),
            param!("buf", "char *", Out, BUF_OUT, aux = Aux::ReturnValue),
            param!("count", "size_t", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 59,
        name: "execve",
        category: Category::Process,
        params: &[
            param!("fname", "const char *", In, CSTR),
            param!("argp", "char *const *", In, RAW),
            param!("envp", "char *const *", In, RAW),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 73,
        name: "munmap",
        category: Category::Memory,
        params: &[
            param!("addr", "void *", In, RAW),
            param!("len", "size_t", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 74,
        name: "mprotect",
        category: Category::Memory,
        params: &[
            param!("addr", "void *", In, RAW),
            param!("len", "size_t", In, UVAL),
            param!("prot", "int", In, MMAP_PROT),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 90,
        name: "dup2",
        category: Category::File,
        params: &[
            param!("from", "int", In, SVAL),
            param!("to", "int", In, SVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 92,
        name: "fcntl",
        category: Category::File,
        params: &[
            param!("fd", "int", In, SVAL),
            param!("cmd", "int", In, UVAL),
            param!("arg", "long", InOut, FD_FLAGS),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 97,
        name: "socket",
        category: Category::Network,
        params: &[
            param!("domain", "int", In, UVAL),
            param!("type", "int", In, UVAL),
            param!("protocol", "int", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 98,
        name: "connect",
        category: Category::Network,
        params: &[
            param!("s", "int", In, SVAL),
            param!("name", "const struct sockaddr *", In, SOCKADDR_IN),
            param!("namelen", "socklen_t", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 104,
        name: "bind",
        category: Category::Network,
        params: &[
            param!("s", "int", In, SVAL),
            param!("name", "const struct sockaddr *", In, SOCKADDR_IN),
            param!("namelen", "socklen_t", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 106,
        name: "listen",
        category: Category::Network,
        params: &[
            param!("s", "int", In, SVAL),
            param!("backlog", "int", In, SVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 116,
        name: "gettimeofday",
        category: Category::Time,
        params: &[
            param!("tp", "struct timeval *", Out, RAW),
            param!("tzp", "struct timezone *", Out, RAW),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 117,
        name: "getrusage",
        category: Category::Process,
        params: &[
            param!("who", "int", In, SVAL),
            param!("rusage", "struct rusage *", Out, RUSAGE_OUT),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 122,
        name: "readv",
        category: Category::File,
        params: &[
            param!("fd", "int", In, SVAL),
            param!("iovp", "const struct iovec *", Out, IOVEC_OUT, aux = Aux::Arg(2)),
            param!("iovcnt", "u_int", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 123,
        name: "writev",
        category: Category::File,
        params: &[
            param!("fd", "int", In, SVAL),
            param!("iovp", "const struct iovec *", In, IOVEC_IN, aux = Aux::Arg(2)),
            param!("iovcnt", "u_int", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 136,
        name: "mkdir",
        category: Category::File,
        params: &[
            param!("path", "const char *", In, CSTR),
            param!("mode", "mode_t", In, OCTAL_MODE),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 137,
        name: "rmdir",
        category: Category::File,
        params: &[param!("path", "const char *", In, CSTR)],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 128,
        name: "rename",
        category: Category::File,
        params: &[
            param!("from", "const char *", In, CSTR),
            param!("to", "const char *", In, CSTR),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 133,
        name: "sendto",
        category: Category::Network,
        params: &[
            param!("s", "int", In, SVAL),
            param!("buf", "const void *", In, BUF_IN, aux = Aux::Arg(2)),
            param!("len", "size_t", In, UVAL),
            param!("flags", "int", In, MSG_FLAGS),
            param!("to", "const struct sockaddr *", In, SOCKADDR_IN, aux = Aux::Arg(5)),
            param!("tolen", "socklen_t", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 163,
        name: "mmap",
        category: Category::Memory,
        params: &[
            param!("addr", "void *", In, RAW),
            param!("len", "size_t", In, UVAL),
            param!("prot", "int", In, MMAP_PROT),
            param!("flags", "int", In, MMAP_FLAGS),
            param!("fd", "int", In, SVAL),
            param!("pos", "off_t", In, SVAL),
        ],
        ret: ReturnDecoder::Raw,
    },
    SyscallSchema {
        number: 266,
        name: "bsdthread_create",
        category: Category::Thread,
        params: &[
            param!("func", "void *", In, RAW),
            param!("func_arg", "void *", In, RAW),
            param!("stack", "void *", In, RAW),
            param!("pthread", "void *", In, RAW),
            param!("flags", "uint32_t", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 339,
        name: "thread_selfid",
        category: Category::Thread,
        params: &[],
        ret: ReturnDecoder::Raw,
    },
    SyscallSchema {
        number: 360,
        name: "stat64",
        category: Category::File,
        params: &[
            param!("path", "const char *", In, CSTR),
            param!("ub", "struct stat *", Out, STAT_OUT),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 361,
        name: "fstat64",
        category: Category::File,
        params: &[
            param!("fd", "int", In, SVAL),
            param!("sb", "struct stat *", Out, STAT_OUT),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 362,
        name: "lstat64",
        category: Category::File,
        params: &[
            param!("path", "const char *", In, CSTR),
            param!("ub", "struct stat *", Out, STAT_OUT),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 397,
        name: "openat",
        category: Category::File,
        params: &[
            param!("fd", "int", In, SVAL),
            param!("path", "const char *", In, CSTR),
            param!("flags", "int", In, OPEN_FLAGS),
            param!("mode", "mode_t", In, OCTAL_MODE),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 400,
        name: "fstatat64",
        category: Category::File,
        params: &[
            param!("fd", "int", In, SVAL),
            param!("path", "const char *", In, CSTR),
            param!("ub", "struct stat *", Out, STAT_OUT),
            param!("flag", "int", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 339 + 1,
        name: "statfs64",
        category: Category::Sysinfo,
        params: &[
            param!("path", "const char *", In, CSTR),
            param!("buf", "struct statfs *", Out, STATFS_OUT),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 472,
        name: "kevent64",
        category: Category::Ipc,
        params: &[
            param!("kq", "int", In, SVAL),
            param!("changelist", "const struct kevent64_s *", In, KEVENT_IO),
            param!("nchanges", "int", In, SVAL),
            param!("eventlist", "struct kevent64_s *", Out, KEVENT_IO),
            param!("nevents", "int", In, SVAL),
            param!("flags", "unsigned int", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 482,
        name: "csops",
        category: Category::Security,
        params: &[
            param!("pid", "pid_t", In, SVAL),
            param!("ops", "uint32_t", In, UVAL),
            param!("useraddr", "void *", Out, RAW),
            param!("usersize", "user_size_t", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 531,
        name: "getentropy",
        category: Category::Security,
        params: &[
            param!("buf", "void *", Out, BUF_OUT, aux = Aux::Arg(1)),
            param!("size", "size_t", In, UVAL),
        ],
        ret: ReturnDecoder::Errno,
    },
    SyscallSchema {
        number: 0,
        name: "syscall",
        category: Category::Misc,
        params: &[],
        ret: ReturnDecoder::Raw,
    },
];
